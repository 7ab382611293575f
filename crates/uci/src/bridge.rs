//! The engine bridge: owns an [`EngineService`], tracks its lifecycle
//! state, and enforces the one-outstanding-search rule. The controller
//! talks to the engine only through a bridge handle.

use crate::builtin::BuiltinEngine;
use crate::error::{EngineError, EngineResult};
use crate::service::{Analysis, EngineConfig, EngineService, LegalityRuling};
use log::{info, warn};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// Lifecycle of the bridged engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Initializing,
    Ready,
    Thinking,
    Error,
}

/// A normalized `bestmove` reply. Empty and `"(none)"` replies that
/// survive the legal-move cross-check collapse to `NoMove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMoveReply {
    Move(String),
    NoMove,
}

const BEST_MOVE_ATTEMPTS: u32 = 3;

/// Cloneable handle to one engine. All clones share the service, its
/// configuration, and the lifecycle state.
#[derive(Clone)]
pub struct EngineBridge {
    inner: Arc<Inner>,
}

struct Inner {
    service: Mutex<Box<dyn EngineService>>,
    state: StdMutex<BridgeState>,
    config: StdMutex<EngineConfig>,
}

impl EngineBridge {
    pub fn new(service: Box<dyn EngineService>) -> Self {
        Self {
            inner: Arc::new(Inner {
                service: Mutex::new(service),
                state: StdMutex::new(BridgeState::Uninitialized),
                config: StdMutex::new(EngineConfig::default()),
            }),
        }
    }

    /// Bridge over the in-process engine.
    pub fn builtin() -> Self {
        Self::new(Box::new(BuiltinEngine::new()))
    }

    pub fn state(&self) -> BridgeState {
        *self.inner.state.lock().unwrap()
    }

    fn set_state(&self, state: BridgeState) {
        *self.inner.state.lock().unwrap() = state;
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.config.lock().unwrap().clone()
    }

    pub fn update_config(&self, update: impl FnOnce(&mut EngineConfig)) {
        update(&mut self.inner.config.lock().unwrap());
    }

    /// Prepares the engine. Idempotent; on failure the bridge parks in
    /// the error state and later calls will retry.
    pub async fn initialize(&self) -> EngineResult<()> {
        if matches!(self.state(), BridgeState::Ready | BridgeState::Thinking) {
            return Ok(());
        }
        self.set_state(BridgeState::Initializing);

        let config = self.config();
        let mut service = self.inner.service.lock().await;
        let outcome = async {
            service.initialize().await?;
            service.configure(&config).await
        }
        .await;

        match outcome {
            Ok(()) => {
                info!(
                    "engine ready: {} ({} threads, {} MB hash)",
                    service.info(),
                    config.threads,
                    config.hash_mb
                );
                self.set_state(BridgeState::Ready);
                Ok(())
            }
            Err(err) => {
                warn!("engine initialization failed: {err}");
                self.set_state(BridgeState::Error);
                Err(err)
            }
        }
    }

    async fn ensure_ready(&self) -> EngineResult<()> {
        match self.state() {
            BridgeState::Ready | BridgeState::Thinking => Ok(()),
            _ => self.initialize().await,
        }
    }

    /// Requests a best move. At most one search is outstanding: callers
    /// arriving while the engine thinks get [`EngineError::Busy`] instead
    /// of queueing. Empty and `"(none)"` replies are cross-checked
    /// against the legal-move list and retried a few times before
    /// collapsing to `NoMove`.
    pub async fn best_move(&self, fen: &str, difficulty: u8) -> EngineResult<BestMoveReply> {
        self.ensure_ready().await?;
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state == BridgeState::Thinking {
                return Err(EngineError::Busy);
            }
            *state = BridgeState::Thinking;
        }
        let _guard = ThinkingGuard { bridge: self };

        let mut service = self.inner.service.lock().await;
        for attempt in 1..=BEST_MOVE_ATTEMPTS {
            let reply = service.best_move(fen, difficulty).await?;
            let reply = reply.trim();
            if !reply.is_empty() && reply != "(none)" {
                return Ok(BestMoveReply::Move(reply.to_string()));
            }
            // No move offered: if the position really is terminal there
            // is nothing to retry.
            if service.legal_moves(fen).await?.is_empty() {
                return Ok(BestMoveReply::NoMove);
            }
            warn!("engine offered no move with moves available (attempt {attempt})");
        }
        Ok(BestMoveReply::NoMove)
    }

    /// Engine-side move legality ruling (layer two of dual validation).
    pub async fn validate_move(&self, fen: &str, uci: &str) -> EngineResult<LegalityRuling> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.is_move_legal(fen, uci).await
    }

    pub async fn legal_moves(&self, fen: &str) -> EngineResult<Vec<String>> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.legal_moves(fen).await
    }

    pub async fn evaluate(&self, fen: &str) -> EngineResult<i32> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.evaluate(fen).await
    }

    pub async fn analyze(&self, fen: &str, depth: u8, time_limit_ms: u64) -> EngineResult<Analysis> {
        self.ensure_ready().await?;
        self.inner
            .service
            .lock()
            .await
            .analyze(fen, depth, time_limit_ms)
            .await
    }

    pub async fn is_in_check(&self, fen: &str) -> EngineResult<bool> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.is_in_check(fen).await
    }

    pub async fn is_checkmate(&self, fen: &str) -> EngineResult<bool> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.is_checkmate(fen).await
    }

    pub async fn is_stalemate(&self, fen: &str) -> EngineResult<bool> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.is_stalemate(fen).await
    }

    /// Signals a running search to stop; its caller sees a no-move reply.
    pub async fn stop(&self) -> EngineResult<()> {
        self.inner.service.lock().await.stop().await
    }

    pub async fn reset(&self) -> EngineResult<()> {
        self.ensure_ready().await?;
        self.inner.service.lock().await.reset().await
    }

    pub async fn info(&self) -> String {
        self.inner.service.lock().await.info()
    }

    pub async fn dispose(&self) -> EngineResult<()> {
        let result = self.inner.service.lock().await.dispose().await;
        self.set_state(BridgeState::Uninitialized);
        result
    }
}

/// Restores the bridge to `Ready` when a search concludes, whichever
/// way it leaves the scope.
struct ThinkingGuard<'a> {
    bridge: &'a EngineBridge,
}

impl Drop for ThinkingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.bridge.inner.state.lock().unwrap();
        if *state == BridgeState::Thinking {
            *state = BridgeState::Ready;
        }
    }
}
