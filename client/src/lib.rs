pub mod api;
pub mod board;
pub mod http;
pub mod inbox;

pub use api::{ApiError, CreateTaskBody, InvitationApi, InvitationView, TaskApi, TaskPatch, TaskView};
pub use board::{NewTask, ProjectBoard};
pub use http::HttpApi;
pub use inbox::{Inbox, InboxEffect};
