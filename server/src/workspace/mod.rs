pub mod invitations;
pub mod members;
