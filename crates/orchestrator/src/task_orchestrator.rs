use std::future::Future;
use std::sync::Arc;

use generator::{ChatClient, CompletionProvider, ContentGenerator, Generation, GenerationSource};
use github::{
    enable_static_hosting, pages_url, GitHubClient, HostingProvider, RepositoryPublisher,
};
use serde_json::Value;
use taskpub_core::{
    CoreError, Round, Round1Request, Round2Request, RoundRequest, TaskSubmission,
};
use tracing::{debug, error, info, warn};

use crate::config::AgentConfig;
use crate::error::{OrchestratorError, Result};
use crate::response::{Round1Summary, Round2Summary, RoundSummary, TaskResponse, ROUND1_MESSAGE};
use crate::state_machine::{FlowProgress, FlowStep};

/// Checks the shared secret and runs the flow of the submitted round.
///
/// Holds no per-task state. Every call rebuilds what it needs from the
/// repository identity, so concurrent calls for different identities are
/// independent.
pub struct TaskOrchestrator {
    config: AgentConfig,
    hosting: Arc<dyn HostingProvider>,
    generator: ContentGenerator,
}

impl TaskOrchestrator {
    pub fn new(
        config: AgentConfig,
        hosting: Arc<dyn HostingProvider>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config,
            hosting,
            generator: ContentGenerator::new(completion),
        }
    }

    /// Wires the GitHub and chat clients from configuration.
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        let hosting = GitHubClient::new(config.github.clone())
            .map_err(|e| OrchestratorError::config(e.to_string()))?;

        if config.llm.api_key.is_none() {
            warn!("No generation API key configured, every round will publish the fallback files");
        }
        let completion = ChatClient::new(config.llm.clone());

        Ok(Self::new(config, Arc::new(hosting), Arc::new(completion)))
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Never fails: every error becomes an error payload.
    pub async fn handle(&self, submission: TaskSubmission) -> TaskResponse {
        respond(self.process(submission).await)
    }

    /// Like [`handle`](Self::handle), for a body that has only been parsed
    /// as JSON. The secret is checked before any field is typed.
    pub async fn handle_json(&self, body: Value) -> TaskResponse {
        respond(self.process_json(body).await)
    }

    pub async fn process(&self, submission: TaskSubmission) -> Result<RoundSummary> {
        self.check_secret(submission.secret.as_deref())?;
        self.dispatch(submission.into_round_request()?).await
    }

    /// Checks the secret, then the round, then the shape of the remaining
    /// fields.
    pub async fn process_json(&self, body: Value) -> Result<RoundSummary> {
        self.check_secret(body.get("secret").and_then(Value::as_str))?;

        if body.get("round").and_then(Round::from_value).is_none() {
            return Err(CoreError::InvalidRound.into());
        }

        let submission = TaskSubmission::from_json(body)?;
        self.dispatch(submission.into_round_request()?).await
    }

    fn check_secret(&self, secret: Option<&str>) -> Result<()> {
        if self.config.secret_matches(secret) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidSecret)
        }
    }

    async fn dispatch(&self, request: RoundRequest) -> Result<RoundSummary> {
        debug!(
            round = request.round().number(),
            repo = %request.context().identity.repo_name(),
            "Task accepted"
        );

        match request {
            RoundRequest::Initial(request) => {
                self.run_initial(request).await.map(RoundSummary::Initial)
            }
            RoundRequest::Revision(request) => {
                self.run_revision(request).await.map(RoundSummary::Revision)
            }
        }
    }

    /// Generate, create the repository, enable hosting, publish. Nothing
    /// is rolled back when a later step fails.
    pub async fn run_initial(&self, request: Round1Request) -> Result<Round1Summary> {
        let context = &request.context;
        let repo_name = context.identity.repo_name();
        let mut progress = FlowProgress::new(Round::Initial);

        info!("Starting Round 1 for repository {}", repo_name);

        let generation = self.generator.generate(context, Round::Initial, None).await;
        log_generation(&generation);
        progress.complete(FlowStep::GenerateFiles)?;

        let repository = run_step(
            &mut progress,
            FlowStep::CreateRepository,
            &repo_name,
            self.hosting.create_repository(&repo_name),
        )
        .await?;
        info!("Repository created: {}", repository.html_url);

        let branch = repository
            .default_branch
            .clone()
            .unwrap_or_else(|| self.config.github.default_branch.clone());

        run_step(
            &mut progress,
            FlowStep::EnableHosting,
            &repo_name,
            enable_static_hosting(self.hosting.as_ref(), &repo_name, &branch),
        )
        .await?;

        let publisher = RepositoryPublisher::new(self.hosting.as_ref(), &branch);
        let report = run_step(
            &mut progress,
            FlowStep::PublishFiles,
            &repo_name,
            publisher.publish(&repo_name, &generation.files, Round::Initial),
        )
        .await?;

        info!(
            "Round 1 complete for {}: {} files written, {} skipped",
            repo_name,
            report.written(),
            report.skipped.len()
        );

        Ok(Round1Summary {
            message: ROUND1_MESSAGE.to_string(),
            pages_url: pages_url(&self.config.github.owner, &repo_name),
            repo_url: repository.html_url,
            repo_name,
            files_created: report.written(),
        })
    }

    /// Regenerate with feedback and publish into the round 1 repository.
    /// A missing repository surfaces as a publish failure.
    pub async fn run_revision(&self, request: Round2Request) -> Result<Round2Summary> {
        let context = &request.context;
        let repo_name = context.identity.repo_name();
        let mut progress = FlowProgress::new(Round::Revision);

        info!("Starting Round 2 for repository {}", repo_name);

        let generation = self
            .generator
            .generate(context, Round::Revision, Some(&request.feedback))
            .await;
        log_generation(&generation);
        progress.complete(FlowStep::GenerateFiles)?;

        let publisher =
            RepositoryPublisher::new(self.hosting.as_ref(), &self.config.github.default_branch);
        let report = run_step(
            &mut progress,
            FlowStep::PublishFiles,
            &repo_name,
            publisher.publish(&repo_name, &generation.files, Round::Revision),
        )
        .await?;

        info!(
            "Round 2 complete for {}: {} files written, {} skipped",
            repo_name,
            report.written(),
            report.skipped.len()
        );

        Ok(Round2Summary::new(
            repo_name,
            report.written(),
            &request.feedback,
        ))
    }
}

fn respond(result: Result<RoundSummary>) -> TaskResponse {
    match result {
        Ok(summary) => summary.into(),
        Err(e) => {
            match &e {
                OrchestratorError::InvalidSecret | OrchestratorError::Validation(_) => {
                    warn!("Rejected task submission: {}", e)
                }
                _ => error!("Task processing failed: {}", e),
            }
            e.into()
        }
    }
}

/// Awaits one provider step and records it, or tags the failure with the
/// step and what finished before it.
async fn run_step<T, F>(
    progress: &mut FlowProgress,
    step: FlowStep,
    repo_name: &str,
    call: F,
) -> Result<T>
where
    F: Future<Output = github::Result<T>>,
{
    match call.await {
        Ok(value) => {
            progress.complete(step)?;
            Ok(value)
        }
        Err(source) => {
            error!(
                step = %step,
                repo = %repo_name,
                completed = ?progress.completed(),
                "Flow step failed: {}",
                source
            );
            Err(OrchestratorError::step(
                step,
                progress.completed().to_vec(),
                repo_name,
                source,
            ))
        }
    }
}

fn log_generation(generation: &Generation) {
    match &generation.source {
        GenerationSource::Model => info!("Generated {} files", generation.files.len()),
        GenerationSource::Fallback { reason } => warn!(
            "Using {} fallback files ({})",
            generation.files.len(),
            reason
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generator::testing::ScriptedCompletion;
    use generator::LlmConfig;
    use github::testing::{Failure, HostCall, HostOp, MemoryHost};
    use github::GitHubConfig;
    use serde_json::json;

    const MODEL_FILES: &str = r##"```json
[
  {"name": "index.html", "content": "<h1>demo</h1>"},
  {"name": "README.md", "content": "# demo"}
]
```"##;

    fn config() -> AgentConfig {
        AgentConfig::new(
            "S",
            GitHubConfig::new("ghp_test", "octo"),
            LlmConfig::default(),
        )
    }

    fn orchestrator(host: &Arc<MemoryHost>, reply: &str) -> TaskOrchestrator {
        TaskOrchestrator::new(
            config(),
            host.clone(),
            Arc::new(ScriptedCompletion::reply(reply)),
        )
    }

    fn submission(value: serde_json::Value) -> TaskSubmission {
        serde_json::from_value(value).unwrap()
    }

    fn round1() -> TaskSubmission {
        submission(json!({
            "secret": "S", "task": "t1", "nonce": "n1", "round": 1, "brief": "demo"
        }))
    }

    fn round2(feedback: &str) -> TaskSubmission {
        submission(json!({
            "secret": "S", "task": "t1", "nonce": "n1", "round": 2,
            "brief": "demo", "evaluation_feedback": feedback
        }))
    }

    #[tokio::test]
    async fn test_invalid_secret_makes_no_calls() {
        let host = Arc::new(MemoryHost::new("octo"));
        let completion = Arc::new(ScriptedCompletion::reply(MODEL_FILES));
        let orchestrator = TaskOrchestrator::new(config(), host.clone(), completion.clone());

        for secret in [json!("wrong"), json!(""), json!(null)] {
            let response = orchestrator
                .handle(submission(json!({
                    "secret": secret, "task": "t1", "nonce": "n1", "round": 1
                })))
                .await;
            assert_eq!(
                serde_json::to_value(&response).unwrap(),
                json!({"error": "Invalid secret"})
            );
        }

        assert!(host.calls().is_empty());
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_secret_checked_before_round() {
        let host = Arc::new(MemoryHost::new("octo"));
        let response = orchestrator(&host, MODEL_FILES)
            .handle(submission(json!({"secret": "nope", "round": 7})))
            .await;
        assert_eq!(response, TaskResponse::error("Invalid secret"));
    }

    #[tokio::test]
    async fn test_raw_body_secret_checked_before_field_types() {
        let host = Arc::new(MemoryHost::new("octo"));
        let completion = Arc::new(ScriptedCompletion::reply(MODEL_FILES));
        let orchestrator = TaskOrchestrator::new(config(), host.clone(), completion.clone());

        let bodies = [
            json!({"secret": "wrong", "task": "t1", "nonce": "n1", "round": 1, "checks": null}),
            json!({"secret": 42, "task": "t1", "nonce": "n1", "round": 1}),
            json!({"secret": "wrong", "task": 5, "round": "one"}),
            json!(["not", "an", "object"]),
        ];
        for body in bodies {
            let response = orchestrator.handle_json(body.clone()).await;
            assert_eq!(response, TaskResponse::error("Invalid secret"), "{body}");
        }

        assert!(host.calls().is_empty());
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_raw_body_round_then_types() {
        let host = Arc::new(MemoryHost::new("octo"));
        let orchestrator = orchestrator(&host, MODEL_FILES);

        let response = orchestrator
            .handle_json(json!({"secret": "S", "task": 5, "round": 3}))
            .await;
        assert_eq!(response, TaskResponse::error("Invalid round"));

        let err = orchestrator
            .process_json(json!({
                "secret": "S", "task": "t1", "nonce": "n1", "round": 1, "checks": null
            }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(taskpub_core::CoreError::Malformed(_))
        ));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_raw_body_runs_round1() {
        let host = Arc::new(MemoryHost::new("octo"));

        let response = orchestrator(&host, MODEL_FILES)
            .handle_json(json!({
                "secret": "S", "task": "t1", "nonce": "n1", "round": 1, "brief": "demo"
            }))
            .await;

        let TaskResponse::Initial(summary) = response else {
            panic!("expected round 1 summary, got {response:?}");
        };
        assert_eq!(summary.files_created, 2);
    }

    #[tokio::test]
    async fn test_invalid_round() {
        let host = Arc::new(MemoryHost::new("octo"));
        let orchestrator = orchestrator(&host, MODEL_FILES);

        for round in [json!(0), json!(3), json!("1"), json!(1.5), json!(null)] {
            let response = orchestrator
                .handle(submission(json!({
                    "secret": "S", "task": "t1", "nonce": "n1", "round": round
                })))
                .await;
            assert_eq!(response, TaskResponse::error("Invalid round"), "round {round}");
        }
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_nonce_is_rejected() {
        let host = Arc::new(MemoryHost::new("octo"));
        let response = orchestrator(&host, MODEL_FILES)
            .handle(submission(json!({"secret": "S", "task": "t1", "round": 1})))
            .await;
        assert_eq!(
            response,
            TaskResponse::error("Missing required field: nonce")
        );
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_round1_creates_enables_and_publishes() {
        let host = Arc::new(MemoryHost::new("octo"));

        let response = orchestrator(&host, MODEL_FILES).handle(round1()).await;

        let TaskResponse::Initial(summary) = response else {
            panic!("expected round 1 summary, got {response:?}");
        };
        assert_eq!(summary.message, "Round 1 processing complete");
        assert_eq!(summary.repo_name, "t1-n1");
        assert_eq!(summary.repo_url, "https://github.com/octo/t1-n1");
        assert_eq!(summary.pages_url, "https://octo.github.io/t1-n1/");
        assert_eq!(summary.files_created, 2);

        assert!(host.pages_enabled("t1-n1"));
        assert_eq!(host.file("t1-n1", "index.html").unwrap(), b"<h1>demo</h1>");

        let ops: Vec<HostOp> = host.calls().iter().map(HostCall::op).collect();
        assert_eq!(
            ops,
            vec![
                HostOp::CreateRepository,
                HostOp::EnableHosting,
                HostOp::GetFileVersion,
                HostOp::PutFile,
                HostOp::GetFileVersion,
                HostOp::PutFile,
            ]
        );
    }

    #[tokio::test]
    async fn test_round1_follows_repository_default_branch() {
        let host = Arc::new(MemoryHost::new("octo").with_default_branch("master"));

        let response = orchestrator(&host, MODEL_FILES).handle(round1()).await;
        assert!(matches!(response, TaskResponse::Initial(_)), "{response:?}");

        let branches: Vec<String> = host
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::EnableHosting { branch, .. }
                | HostCall::GetFileVersion { branch, .. }
                | HostCall::PutFile { branch, .. } => Some(branch),
                HostCall::CreateRepository { .. } => None,
            })
            .collect();
        assert_eq!(branches.len(), 5);
        assert!(branches.iter().all(|b| b == "master"), "{branches:?}");
    }

    #[tokio::test]
    async fn test_round1_twice_propagates_creation_failure() {
        let host = Arc::new(MemoryHost::new("octo"));
        let orchestrator = orchestrator(&host, MODEL_FILES);

        orchestrator.handle(round1()).await;
        host.clear_calls();

        let err = orchestrator.process(round1()).await.unwrap_err();

        assert_eq!(err.provider_status(), Some(422));
        match &err {
            OrchestratorError::Step {
                step, completed, ..
            } => {
                assert_eq!(*step, FlowStep::CreateRepository);
                assert_eq!(completed, &vec![FlowStep::GenerateFiles]);
            }
            other => panic!("expected step failure, got {other:?}"),
        }
        assert_eq!(host.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_hosting_failure_reports_partial_progress() {
        let host = Arc::new(MemoryHost::new("octo"));
        host.inject(Failure::on(HostOp::EnableHosting, 403, "Resource not accessible"));

        let response = orchestrator(&host, MODEL_FILES).handle(round1()).await;
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["repo_name"], "t1-n1");
        assert_eq!(value["failed_step"], "enable_hosting");
        assert_eq!(
            value["completed_steps"],
            json!(["generate_files", "create_repository"])
        );
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("Resource not accessible"));

        // created repository stays; no file was written
        assert!(host.repo_exists("t1-n1"));
        assert!(host.file("t1-n1", "index.html").is_none());
    }

    #[tokio::test]
    async fn test_publish_failure_names_file() {
        let host = Arc::new(MemoryHost::new("octo"));
        host.inject(Failure::on(HostOp::PutFile, 500, "boom").for_path("README.md"));

        let err = orchestrator(&host, MODEL_FILES)
            .process(round1())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("README.md"));
        match err {
            OrchestratorError::Step {
                step, completed, ..
            } => {
                assert_eq!(step, FlowStep::PublishFiles);
                assert_eq!(completed.len(), 3);
            }
            other => panic!("expected step failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_generation_still_succeeds() {
        let host = Arc::new(MemoryHost::new("octo"));

        let response = orchestrator(&host, "Sorry, I can't do that.")
            .handle(round1())
            .await;

        let TaskResponse::Initial(summary) = response else {
            panic!("expected round 1 summary, got {response:?}");
        };
        assert_eq!(summary.files_created, generator::fallback_files().len());
        assert!(host.file("t1-n1", "index.html").is_some());
    }

    #[tokio::test]
    async fn test_round2_updates_existing_files() {
        let host = Arc::new(MemoryHost::new("octo"));
        let orchestrator = orchestrator(&host, MODEL_FILES);
        orchestrator.handle(round1()).await;
        host.clear_calls();

        let response = orchestrator.handle(round2("fix layout")).await;

        let TaskResponse::Revision(summary) = response else {
            panic!("expected round 2 summary, got {response:?}");
        };
        assert_eq!(summary.message, "Round 2 code modification complete");
        assert_eq!(summary.repo_name, "t1-n1");
        assert_eq!(summary.files_updated, 2);
        assert_eq!(summary.feedback_applied, "fix layout");

        let calls = host.calls();
        assert!(calls
            .iter()
            .all(|c| matches!(c.op(), HostOp::GetFileVersion | HostOp::PutFile)));
        assert!(calls.iter().any(|c| matches!(
            c,
            HostCall::PutFile { message, sha: Some(_), .. } if message == "Add/Update index.html for Round 2"
        )));
    }

    #[tokio::test]
    async fn test_round2_without_repository_fails_at_publish() {
        let host = Arc::new(MemoryHost::new("octo"));

        let response = orchestrator(&host, MODEL_FILES)
            .handle(round2("fix layout"))
            .await;

        let TaskResponse::Error(body) = response else {
            panic!("expected error, got {response:?}");
        };
        assert_eq!(body.failed_step, Some(FlowStep::PublishFiles));
        assert_eq!(body.completed_steps, vec![FlowStep::GenerateFiles]);
        assert!(!host.repo_exists("t1-n1"));
    }

    #[tokio::test]
    async fn test_round2_truncates_long_feedback() {
        let host = Arc::new(MemoryHost::new("octo"));
        let orchestrator = orchestrator(&host, MODEL_FILES);
        orchestrator.handle(round1()).await;

        let feedback = "x".repeat(120);
        let response = orchestrator.handle(round2(&feedback)).await;

        let TaskResponse::Revision(summary) = response else {
            panic!("expected round 2 summary, got {response:?}");
        };
        assert_eq!(summary.feedback_applied.len(), 103);
        assert!(summary.feedback_applied.ends_with("..."));
    }

    #[test]
    fn test_from_config_rejects_missing_token() {
        let mut config = config();
        config.github = GitHubConfig::new("", "octo");
        assert!(matches!(
            TaskOrchestrator::from_config(config),
            Err(OrchestratorError::Config(_))
        ));
    }
}
