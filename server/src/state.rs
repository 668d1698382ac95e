use std::sync::Arc;

use kanri_core::{
    db::Database, invitation::InvitationStore, project::ProjectStore, task::TaskStore,
    user::UserStore, workspace::WorkspaceStore,
};

use crate::user::service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_store: UserStore,
    pub workspace_store: WorkspaceStore,
    pub project_store: ProjectStore,
    pub task_store: TaskStore,
    pub invitation_store: InvitationStore,
    pub user_service: Arc<UserService>,
}

pub fn build_state(database: &Database) -> AppState {
    let user_store = UserStore::new(database);
    let user_service = Arc::new(UserService::new(user_store.clone()));

    AppState {
        user_store,
        workspace_store: WorkspaceStore::new(database),
        project_store: ProjectStore::new(database),
        task_store: TaskStore::new(database),
        invitation_store: InvitationStore::new(database),
        user_service,
    }
}
