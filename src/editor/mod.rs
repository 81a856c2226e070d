//! Group membership editing core.
//!
//! Everything here is synchronous state manipulation except the calls made
//! through the injected collaborators in `collab`.

pub mod collab;
pub mod debounce;
pub mod diff;
pub mod edit_log;
pub mod history;
pub mod photos;
pub mod projector;
pub mod session;
pub mod state;
pub mod validation;

pub use collab::{Collaborators, GroupSubmitter, MemberSource, PhotoUploader};
pub use debounce::Debounced;
pub use diff::compute_changes;
pub use edit_log::EditLog;
pub use history::History;
pub use photos::{MemberForm, SlotStatus};
pub use projector::{project_create, project_edit, MemberView};
pub use session::{EditorSettings, FetchResult, GroupEditor, PendingFetch, PendingSubmit};
pub use state::{CreateState, EditState, GroupDetails};
pub use validation::is_phone_number_taken;
