//! Aggregate client.
//!
//! Bundles one implementation of every capability service for the
//! configured provider behind trait objects, so calling code never names a
//! driver type.

use std::sync::Arc;

use url::Url;

use crate::config::{ClientConfig, ProviderKind};
use crate::driver::tencentgit::{
    Api, GitClient, IssuesClient, MilestonesClient, OrgsClient, PullsClient, ReleasesClient,
    ReposClient, ReviewsClient, UsersClient, WebhooksClient,
};
use crate::error::Result;
use crate::services::{
    GitService, IssueService, MilestoneService, OrganizationService, PullRequestService,
    ReleaseService, RepositoryService, ReviewService, UserService, WebhookService,
};
use crate::transport::{HttpTransport, RequestExecutor};

/// Provider-agnostic SCM client.
///
/// # Example
///
/// ```rust,ignore
/// use scm::{Client, ClientConfig, Context};
///
/// let client = Client::new(ClientConfig::from_env()?)?;
/// let ctx = Context::background();
/// let (repo, res) = client.repositories().find(&ctx, "xinnjie/testme").await?;
/// println!("{} ({} requests left)", repo.full_name, res.rate.remaining);
/// ```
#[derive(Clone)]
pub struct Client {
    driver: ProviderKind,
    base_url: Url,
    repositories: Arc<dyn RepositoryService>,
    pull_requests: Arc<dyn PullRequestService>,
    issues: Arc<dyn IssueService>,
    milestones: Arc<dyn MilestoneService>,
    releases: Arc<dyn ReleaseService>,
    organizations: Arc<dyn OrganizationService>,
    users: Arc<dyn UserService>,
    reviews: Arc<dyn ReviewService>,
    git: Arc<dyn GitService>,
    webhooks: Arc<dyn WebhookService>,
}

impl Client {
    /// Create a client talking HTTP to the configured server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.server.clone(), config.token, config.timeout)?;
        Ok(Self::with_executor(
            config.driver,
            config.server,
            Arc::new(transport),
        ))
    }

    /// Create a client from `SCM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport
    /// cannot be created.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client on top of any request executor.
    ///
    /// # Arguments
    ///
    /// * `driver` - Provider driver
    /// * `base_url` - Server base URL, used to build web links
    /// * `executor` - Executor every request is sent through
    #[must_use]
    pub fn with_executor(
        driver: ProviderKind,
        base_url: Url,
        executor: Arc<dyn RequestExecutor>,
    ) -> Self {
        match driver {
            ProviderKind::TencentGit => Self::tencentgit(base_url, executor),
        }
    }

    fn tencentgit(base_url: Url, executor: Arc<dyn RequestExecutor>) -> Self {
        let api = Arc::new(Api::new(executor, base_url.clone()));
        let users: Arc<dyn UserService> = Arc::new(UsersClient::new(Arc::clone(&api)));

        Self {
            driver: ProviderKind::TencentGit,
            base_url,
            repositories: Arc::new(ReposClient::new(Arc::clone(&api))),
            pull_requests: Arc::new(PullsClient::new(Arc::clone(&api))),
            issues: Arc::new(IssuesClient::new(Arc::clone(&api))),
            milestones: Arc::new(MilestonesClient::new(Arc::clone(&api))),
            releases: Arc::new(ReleasesClient::new(Arc::clone(&api))),
            organizations: Arc::new(OrgsClient::new(Arc::clone(&api))),
            reviews: Arc::new(ReviewsClient),
            git: Arc::new(GitClient::new(Arc::clone(&api))),
            webhooks: Arc::new(WebhooksClient::new(Arc::clone(&users))),
            users,
        }
    }

    /// The provider driver in use.
    #[must_use]
    pub fn driver(&self) -> ProviderKind {
        self.driver
    }

    /// Server base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the repositories service.
    #[must_use]
    pub fn repositories(&self) -> &dyn RepositoryService {
        self.repositories.as_ref()
    }

    /// Get the pull requests service.
    #[must_use]
    pub fn pull_requests(&self) -> &dyn PullRequestService {
        self.pull_requests.as_ref()
    }

    /// Get the issues service.
    #[must_use]
    pub fn issues(&self) -> &dyn IssueService {
        self.issues.as_ref()
    }

    /// Get the milestones service.
    #[must_use]
    pub fn milestones(&self) -> &dyn MilestoneService {
        self.milestones.as_ref()
    }

    /// Get the releases service.
    #[must_use]
    pub fn releases(&self) -> &dyn ReleaseService {
        self.releases.as_ref()
    }

    /// Get the organizations service.
    #[must_use]
    pub fn organizations(&self) -> &dyn OrganizationService {
        self.organizations.as_ref()
    }

    /// Get the users service.
    #[must_use]
    pub fn users(&self) -> &dyn UserService {
        self.users.as_ref()
    }

    /// Get the reviews service.
    #[must_use]
    pub fn reviews(&self) -> &dyn ReviewService {
        self.reviews.as_ref()
    }

    /// Get the git service.
    #[must_use]
    pub fn git(&self) -> &dyn GitService {
        self.git.as_ref()
    }

    /// Get the webhook parser.
    #[must_use]
    pub fn webhooks(&self) -> &dyn WebhookService {
        self.webhooks.as_ref()
    }
}
