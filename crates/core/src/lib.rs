pub mod domain;
pub mod error;

pub use domain::file::{FileContent, GeneratedFile};
pub use domain::repository::{RepoIdentity, VersionToken};
pub use domain::submission::{
    Attachment, Round, Round1Request, Round2Request, RoundRequest, TaskContext, TaskSubmission,
    DEFAULT_BRIEF, DEFAULT_FEEDBACK,
};
pub use error::{CoreError, Result};
