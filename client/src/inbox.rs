// Invitation inbox controller

use crate::api::{ApiError, InvitationApi, InvitationView};

/// What the embedding UI must do after an inbox action succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxEffect {
    /// Accepting changed the caller's memberships; workspace data is stale.
    RefreshWorkspaceData,
    /// Nothing beyond the inbox itself changed.
    None,
}

pub struct Inbox<A: InvitationApi> {
    api: A,
    invitations: Vec<InvitationView>,
}

impl<A: InvitationApi> Inbox<A> {
    pub async fn load(api: A) -> Result<Self, ApiError> {
        let invitations = api.list_invitations().await?;
        Ok(Self { api, invitations })
    }

    pub fn invitations(&self) -> &[InvitationView] {
        &self.invitations
    }

    pub async fn accept(&mut self, invitation_id: &str) -> Result<InboxEffect, ApiError> {
        self.api.accept_invitation(invitation_id).await?;
        self.invitations
            .retain(|invitation| invitation.id != invitation_id);
        Ok(InboxEffect::RefreshWorkspaceData)
    }

    /// Deny asks for confirmation before anything goes on the wire. An
    /// unconfirmed deny is a no-op reported as `None`.
    pub async fn deny(
        &mut self,
        invitation_id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<InboxEffect, ApiError> {
        if !confirm() {
            return Ok(InboxEffect::None);
        }

        self.api.decline_invitation(invitation_id).await?;
        self.invitations
            .retain(|invitation| invitation.id != invitation_id);
        Ok(InboxEffect::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InvitationInviter, InvitationWorkspace};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn sample_invitation(id: &str) -> InvitationView {
        InvitationView {
            id: id.to_owned(),
            workspace: InvitationWorkspace {
                id: "workspace-1".to_owned(),
                name: "Team".to_owned(),
            },
            inviter: InvitationInviter {
                id: "user-1".to_owned(),
                email: "owner@example.com".to_owned(),
                name: None,
            },
            status: "PENDING".to_owned(),
            created_at: "2026-08-01T00:00:00Z".to_owned(),
        }
    }

    #[derive(Default)]
    struct ScriptedApi {
        listed: Vec<InvitationView>,
        accept_result: Mutex<Option<Result<(), ApiError>>>,
        decline_result: Mutex<Option<Result<(), ApiError>>>,
        declines_sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InvitationApi for &ScriptedApi {
        async fn list_invitations(&self) -> Result<Vec<InvitationView>, ApiError> {
            Ok(self.listed.clone())
        }

        async fn accept_invitation(&self, _invitation_id: &str) -> Result<(), ApiError> {
            self.accept_result.lock().take().unwrap_or(Ok(()))
        }

        async fn decline_invitation(&self, invitation_id: &str) -> Result<(), ApiError> {
            self.declines_sent.lock().push(invitation_id.to_owned());
            self.decline_result.lock().take().unwrap_or(Ok(()))
        }
    }

    #[tokio::test]
    async fn accept_removes_the_item_and_requests_a_refresh() {
        let api = ScriptedApi {
            listed: vec![sample_invitation("i1"), sample_invitation("i2")],
            ..Default::default()
        };

        let mut inbox = Inbox::load(&api).await.unwrap();
        let effect = inbox.accept("i1").await.unwrap();

        assert_eq!(effect, InboxEffect::RefreshWorkspaceData);
        assert_eq!(inbox.invitations().len(), 1);
        assert_eq!(inbox.invitations()[0].id, "i2");
    }

    #[tokio::test]
    async fn failed_accept_keeps_the_item() {
        let api = ScriptedApi {
            listed: vec![sample_invitation("i1")],
            ..Default::default()
        };
        *api.accept_result.lock() = Some(Err(ApiError::Http {
            status: 404,
            message: "Invitation not found".to_owned(),
        }));

        let mut inbox = Inbox::load(&api).await.unwrap();
        let err = inbox.accept("i1").await.unwrap_err();

        assert_eq!(err.message(), "Invitation not found");
        assert_eq!(inbox.invitations().len(), 1);
    }

    #[tokio::test]
    async fn unconfirmed_deny_never_reaches_the_api() {
        let api = ScriptedApi {
            listed: vec![sample_invitation("i1")],
            ..Default::default()
        };

        let mut inbox = Inbox::load(&api).await.unwrap();
        let effect = inbox.deny("i1", || false).await.unwrap();

        assert_eq!(effect, InboxEffect::None);
        assert_eq!(inbox.invitations().len(), 1);
        assert!(api.declines_sent.lock().is_empty());
    }

    #[tokio::test]
    async fn confirmed_deny_removes_the_item_locally_only() {
        let api = ScriptedApi {
            listed: vec![sample_invitation("i1"), sample_invitation("i2")],
            ..Default::default()
        };

        let mut inbox = Inbox::load(&api).await.unwrap();
        let effect = inbox.deny("i2", || true).await.unwrap();

        assert_eq!(effect, InboxEffect::None);
        assert_eq!(inbox.invitations().len(), 1);
        assert_eq!(inbox.invitations()[0].id, "i1");
        assert_eq!(api.declines_sent.lock().as_slice(), ["i2".to_owned()]);
    }
}
