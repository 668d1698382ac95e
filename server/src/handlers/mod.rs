pub mod auth_handlers;
pub mod health_handlers;
pub mod invitation_handlers;
pub mod member_handlers;
pub mod task_handlers;
