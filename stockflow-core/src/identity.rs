use async_trait::async_trait;
use std::collections::HashSet;

use crate::BoxError;

/// Role check consumed from the staff subsystem: may this principal
/// approve or reject transfer requests? The core never authenticates;
/// it only asks this question before acting.
#[async_trait]
pub trait ApproverDirectory: Send + Sync {
    async fn is_authorized_approver(&self, principal_id: &str) -> Result<bool, BoxError>;
}

/// Directory backed by a fixed set of principal ids, loaded from
/// configuration. Production deployments swap in a staff-service client.
pub struct StaticApproverDirectory {
    approvers: HashSet<String>,
}

impl StaticApproverDirectory {
    pub fn with_approvers<I, S>(approvers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            approvers: approvers.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ApproverDirectory for StaticApproverDirectory {
    async fn is_authorized_approver(&self, principal_id: &str) -> Result<bool, BoxError> {
        Ok(self.approvers.contains(principal_id))
    }
}
