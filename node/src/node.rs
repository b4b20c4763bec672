//! The site node: storage, secrets, credentials, content and the HTTP API
//! wired together once and shared as `Arc` state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dailyread_accounts::AccountWorkflows;
use dailyread_mail::{HttpRelayTransport, MailTransport};
use dailyread_rpc::{AppState, RpcServer, SessionRegistry, SiteMetrics};
use dailyread_secrets::{CredentialCipher, SecretStore};
use dailyread_sources::{DailyContentService, HttpSourceClient, DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL};
use dailyread_store::{AccountStore, ConfigStore, ContentSourceStore, Settings, VerificationCodeStore};
use dailyread_store_lmdb::environment::DATABASE_COUNT;
use dailyread_store_lmdb::integrity::{check_data_dir, check_integrity};
use dailyread_store_lmdb::LmdbEnvironment;
use dailyread_types::{Clock, NewContentSource, SystemClock};
use dailyread_verification::{ChallengeGate, VerificationLedger};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::sweeper::spawn_sweeper;
use crate::{NodeError, ShutdownController, SiteConfig};

/// How long [`SiteNode::stop`] waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SiteNode {
    pub config: SiteConfig,
    env: LmdbEnvironment,
    pub settings: Settings,
    pub secrets: SecretStore,
    pub cipher: Arc<CredentialCipher>,
    pub sources: Arc<dyn ContentSourceStore>,
    pub ledger: Arc<VerificationLedger>,
    pub gate: Arc<ChallengeGate>,
    pub daily: Arc<DailyContentService>,
    pub workflows: Arc<AccountWorkflows>,
    pub sessions: Arc<SessionRegistry>,
    pub metrics: Arc<SiteMetrics>,
    shutdown: Arc<ShutdownController>,
    http_addr: Option<SocketAddr>,
    task_handles: Vec<JoinHandle<()>>,
}

impl SiteNode {
    /// Open storage at `config.data_dir` and build every component.
    ///
    /// Nothing is served until [`start`](Self::start). The credential key
    /// is not touched here; subcommands that never encrypt never create one.
    pub fn new(config: SiteConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SiteConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        check_data_dir(&config.data_dir).map_err(NodeError::DataDir)?;
        let env = LmdbEnvironment::open(&config.data_dir, DATABASE_COUNT, config.map_size_bytes())?;
        let report = check_integrity(&env)?;
        if !report.is_healthy() {
            for error in &report.errors {
                tracing::warn!(%error, "integrity check");
            }
        }

        let config_store: Arc<dyn ConfigStore> = Arc::new(env.config_store());
        let code_store: Arc<dyn VerificationCodeStore> = Arc::new(env.verification_store());
        let sources: Arc<dyn ContentSourceStore> = Arc::new(env.source_store());
        let accounts: Arc<dyn AccountStore> = Arc::new(env.account_store());

        let settings = Settings::new(Arc::clone(&config_store), Arc::clone(&clock));
        let secrets = SecretStore::new(config_store, Arc::clone(&clock))
            .with_operator_key(config.secret_key.as_deref())?;
        let cipher = Arc::new(CredentialCipher::new(secrets.clone()));

        let ledger = Arc::new(VerificationLedger::new(
            code_store,
            Arc::clone(&clock),
            config.ledger_config(),
        ));
        let gate = Arc::new(ChallengeGate::new(Arc::clone(&clock), config.challenge_config()));
        let mailer: Arc<dyn MailTransport> =
            Arc::new(HttpRelayTransport::new(settings.clone(), Arc::clone(&cipher))?);

        seed_default_source(sources.as_ref(), clock.as_ref())?;
        let fetcher = Arc::new(HttpSourceClient::with_timeout(Duration::from_secs(
            config.source_timeout_secs,
        ))?);
        let daily = Arc::new(DailyContentService::new(
            Arc::clone(&sources),
            settings.clone(),
            fetcher,
            config.source_polling_algorithm,
        ));

        let workflows = Arc::new(
            AccountWorkflows::new(
                accounts,
                Arc::clone(&ledger),
                Arc::clone(&gate),
                mailer,
                Arc::clone(&clock),
            )
            .with_hashing(config.password_hashing.clone()),
        );

        tracing::info!(data_dir = %config.data_dir.display(), "site node initialised");
        Ok(Self {
            sessions: Arc::new(SessionRegistry::new(clock)),
            metrics: Arc::new(SiteMetrics::new()),
            config,
            env,
            settings,
            secrets,
            cipher,
            sources,
            ledger,
            gate,
            daily,
            workflows,
            shutdown: Arc::new(ShutdownController::new()),
            http_addr: None,
            task_handles: Vec::new(),
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.workflows),
            Arc::clone(&self.daily),
            Arc::clone(&self.sessions),
            Arc::clone(&self.metrics),
        )
    }

    pub fn shutdown_controller(&self) -> &Arc<ShutdownController> {
        &self.shutdown
    }

    /// Address the HTTP API is bound to, once started.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Bind the HTTP API and spawn the background tasks. Returns once
    /// everything is running.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyStarted);
        }

        // A broken key store should be loud at startup, but the site still
        // serves content; credential operations fail closed on their own.
        match self.cipher.record() {
            Ok(record) => tracing::info!(
                origin = %record.origin,
                fingerprint = %record.key.fingerprint(),
                "credential key ready"
            ),
            Err(e) => tracing::error!(error = %e, "credential key unavailable"),
        }

        let sweep_handle = spawn_sweeper(
            Arc::clone(&self.ledger),
            Arc::clone(&self.sessions),
            Duration::from_secs(self.config.sweep_interval_secs),
            self.config.session_idle_secs,
            self.shutdown.subscribe(),
        );
        self.task_handles.push(sweep_handle);

        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], self.config.rpc_port))).await?;
        self.http_addr = Some(listener.local_addr()?);
        let server = RpcServer::with_state(self.config.rpc_port, self.app_state());
        let mut shutdown_rx = self.shutdown.subscribe();
        let http_handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("HTTP API shutting down");
                }
                result = server.serve(listener) => {
                    match result {
                        Ok(()) => tracing::info!("HTTP API exited"),
                        Err(e) => tracing::error!("HTTP API error: {e}"),
                    }
                }
            }
        });
        self.task_handles.push(http_handle);

        tracing::info!("dailyread node started");
        Ok(())
    }

    /// Block until SIGINT, SIGTERM or a programmatic shutdown.
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.wait_for_signal().await;
    }

    /// Stop the node gracefully.
    ///
    /// 1. Sends the shutdown signal to all background tasks.
    /// 2. Waits for them to finish (with timeout).
    /// 3. Flushes LMDB to disk.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("dailyread node stopping");
        self.shutdown.shutdown();

        let handles = std::mem::take(&mut self.task_handles);
        let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background task ended abnormally");
                }
            }
        })
        .await;

        if let Err(e) = self.env.env().force_sync() {
            tracing::warn!(error = %e, "LMDB sync failed");
        }

        match joined {
            Ok(()) => {
                tracing::info!("dailyread node stopped");
                Ok(())
            }
            Err(_) => Err(NodeError::ShutdownTimeout),
        }
    }
}

/// Register the original upstream when no sources are configured at all.
pub fn seed_default_source(sources: &dyn ContentSourceStore, clock: &dyn Clock) -> Result<bool, NodeError> {
    if !sources.list_sources()?.is_empty() {
        return Ok(false);
    }
    let seeded = sources.put_source(
        NewContentSource::enabled(DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL),
        clock.now(),
    )?;
    tracing::info!(source_id = seeded.id, url = %seeded.url, "seeded default content source");
    Ok(true)
}
