//! Client for an external UCI engine process.
//!
//! The engine executable is spawned with piped stdio, taken through the
//! `uci`/`isready` handshake, and then driven with `position` + `go`
//! requests. Ruling operations are answered locally from the rules
//! crate: plain UCI exposes no legality or terminal-state queries.

use crate::error::{EngineError, EngineResult};
use crate::ruling;
use crate::service::{Analysis, EngineConfig, EngineService, LegalityRuling};
use async_trait::async_trait;
use log::{debug, warn};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

const HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
/// Grace added on top of the configured move time before a search reply
/// is declared lost.
const REPLY_GRACE_MS: u64 = 30_000;

pub struct UciProcessEngine {
    program: PathBuf,
    config: EngineConfig,
    session: Option<Session>,
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl UciProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config: EngineConfig::default(),
            session: None,
        }
    }

    async fn spawn(&mut self) -> EngineResult<()> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| EngineError::Unreachable(format!("{}: {err}", self.program.display())))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unreachable("no stdin pipe".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unreachable("no stdout pipe".into()))?;

        self.session = Some(Session {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        });

        self.send("uci").await?;
        self.read_until(HANDSHAKE_TIMEOUT_MS, |line| line == "uciok").await?;
        self.send("isready").await?;
        self.read_until(HANDSHAKE_TIMEOUT_MS, |line| line == "readyok").await?;
        Ok(())
    }

    fn session_mut(&mut self) -> EngineResult<&mut Session> {
        self.session.as_mut().ok_or(EngineError::NotInitialized)
    }

    async fn send(&mut self, command: &str) -> EngineResult<()> {
        debug!("uci -> {command}");
        let session = self.session_mut()?;
        session.stdin.write_all(command.as_bytes()).await?;
        session.stdin.write_all(b"\n").await?;
        session.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until `accept` matches one, returning the match.
    async fn read_until(
        &mut self,
        timeout_ms: u64,
        accept: impl Fn(&str) -> bool,
    ) -> EngineResult<String> {
        let session = self.session_mut()?;
        let wait = Duration::from_millis(timeout_ms);
        loop {
            let line = timeout(wait, session.lines.next_line())
                .await
                .map_err(|_| EngineError::Timeout(timeout_ms))?
                .map_err(EngineError::Io)?
                .ok_or_else(|| EngineError::Unreachable("engine closed its stdout".into()))?;
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            debug!("uci <- {line}");
            if accept(&line) {
                return Ok(line);
            }
        }
    }

    /// Sends `position` + `go` and collects the reply up to `bestmove`,
    /// folding `info` lines into an [`Analysis`].
    async fn go(&mut self, fen: &str, depth: u8, time_limit_ms: u64) -> EngineResult<Analysis> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth} movetime {time_limit_ms}"))
            .await?;

        let mut analysis = Analysis::default();
        let reply_window = time_limit_ms + REPLY_GRACE_MS;
        let line = {
            let analysis = &mut analysis;
            let session = self.session_mut()?;
            let wait = Duration::from_millis(reply_window);
            loop {
                let line = timeout(wait, session.lines.next_line())
                    .await
                    .map_err(|_| EngineError::Timeout(reply_window))?
                    .map_err(EngineError::Io)?
                    .ok_or_else(|| EngineError::Unreachable("engine closed its stdout".into()))?;
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                debug!("uci <- {line}");
                if line.starts_with("info ") {
                    fold_info_line(&line, analysis);
                } else if line.starts_with("bestmove") {
                    break line;
                }
            }
        };

        let mut tokens = line.split_whitespace();
        let _keyword = tokens.next();
        analysis.best_move = match tokens.next() {
            Some("(none)") | None => None,
            Some(mv) => Some(mv.to_string()),
        };
        if tokens.next() == Some("ponder") {
            analysis.ponder = tokens.next().map(str::to_string);
        }
        Ok(analysis)
    }
}

/// Folds one `info` line into the running analysis.
fn fold_info_line(line: &str, analysis: &mut Analysis) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut i = 1;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    analysis.depth = v;
                }
                i += 2;
            }
            "nodes" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    analysis.nodes = v;
                }
                i += 2;
            }
            "nps" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    analysis.nps = v;
                }
                i += 2;
            }
            "time" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    analysis.time_ms = v;
                }
                i += 2;
            }
            "score" => {
                if tokens.get(i + 1) == Some(&"cp") {
                    if let Some(v) = tokens.get(i + 2).and_then(|t| t.parse().ok()) {
                        analysis.score_cp = v;
                    }
                }
                i += 3;
            }
            "pv" => {
                analysis.pv = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
                break;
            }
            _ => i += 1,
        }
    }
}

#[async_trait]
impl EngineService for UciProcessEngine {
    async fn initialize(&mut self) -> EngineResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        self.spawn().await
    }

    async fn configure(&mut self, config: &EngineConfig) -> EngineResult<()> {
        self.config = config.clone();
        self.send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", config.hash_mb))
            .await?;
        Ok(())
    }

    async fn set_position(&mut self, fen: &str) -> EngineResult<()> {
        self.send(&format!("position fen {fen}")).await
    }

    async fn best_move(&mut self, fen: &str, difficulty: u8) -> EngineResult<String> {
        let depth = difficulty.clamp(1, 12);
        let analysis = self.go(fen, depth, self.config.move_time_ms).await?;
        Ok(analysis.best_move.unwrap_or_else(|| "(none)".to_string()))
    }

    async fn analyze(
        &mut self,
        fen: &str,
        depth: u8,
        time_limit_ms: u64,
    ) -> EngineResult<Analysis> {
        self.go(fen, depth, time_limit_ms).await
    }

    async fn is_move_legal(&mut self, fen: &str, uci: &str) -> EngineResult<LegalityRuling> {
        ruling::rule_move(fen, uci)
    }

    async fn legal_moves(&mut self, fen: &str) -> EngineResult<Vec<String>> {
        ruling::rule_legal_moves(fen)
    }

    async fn evaluate(&mut self, fen: &str) -> EngineResult<i32> {
        let analysis = self.go(fen, 8, 1000).await?;
        Ok(analysis.score_cp)
    }

    async fn is_in_check(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_in_check(fen)
    }

    async fn is_checkmate(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_checkmate(fen)
    }

    async fn is_stalemate(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_stalemate(fen)
    }

    async fn stop(&mut self) -> EngineResult<()> {
        self.send("stop").await
    }

    async fn reset(&mut self) -> EngineResult<()> {
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.read_until(HANDSHAKE_TIMEOUT_MS, |line| line == "readyok")
            .await?;
        Ok(())
    }

    fn info(&self) -> String {
        format!("uci process engine ({})", self.program.display())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if self.session.is_some() {
            if let Err(err) = self.send("quit").await {
                warn!("engine ignored quit: {err}");
            }
            if let Some(mut session) = self.session.take() {
                if timeout(Duration::from_millis(2000), session.child.wait())
                    .await
                    .is_err()
                {
                    session.child.kill().await.ok();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_lines_fold_into_the_analysis() {
        let mut analysis = Analysis::default();
        fold_info_line(
            "info depth 7 score cp 34 nodes 84211 nps 910000 time 92 pv b2e2 h7e7",
            &mut analysis,
        );
        assert_eq!(analysis.depth, 7);
        assert_eq!(analysis.score_cp, 34);
        assert_eq!(analysis.nodes, 84_211);
        assert_eq!(analysis.nps, 910_000);
        assert_eq!(analysis.time_ms, 92);
        assert_eq!(analysis.pv, vec!["b2e2", "h7e7"]);
    }

    #[tokio::test]
    async fn unspawned_engine_reports_not_initialized() {
        let mut engine = UciProcessEngine::new("/nonexistent/engine");
        assert!(matches!(
            engine.set_position(rules::START_FEN).await,
            Err(EngineError::NotInitialized)
        ));
    }
}
