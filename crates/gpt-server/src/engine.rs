//! A loaded model bound to its identifier.

use std::sync::Arc;

use gpt_engine::{Hyperparameters, LanguageModel};
use gpt_runtime::LoadedModel;
use gpt_tokenizer::Tokenizer;
use tokio::sync::Semaphore;

use crate::completion::CompletionParams;
use crate::error::ServerError;
use crate::models::Choice;

/// One servable model.
///
/// Generation on an engine is serialized: `run` holds the engine's single
/// session permit for the whole blocking call. Distinct engines run in
/// parallel.
pub struct Engine {
    id: String,
    pub(crate) model: Arc<dyn LanguageModel>,
    pub(crate) tokenizer: Arc<dyn Tokenizer>,
    session: Arc<Semaphore>,
}

impl Engine {
    pub fn new(
        id: impl Into<String>,
        model: Arc<dyn LanguageModel>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            id: id.into(),
            model,
            tokenizer,
            session: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hparams(&self) -> &Hyperparameters {
        self.model.hparams()
    }

    /// Wait for the engine, then generate on the blocking pool.
    pub async fn run(self: Arc<Self>, params: CompletionParams) -> Result<Vec<Choice>, ServerError> {
        let permit = Arc::clone(&self.session)
            .acquire_owned()
            .await
            .map_err(|_| ServerError::Unavailable)?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            self.complete(&params)
        })
        .await?
    }
}

impl From<LoadedModel> for Engine {
    fn from(loaded: LoadedModel) -> Self {
        Self::new(loaded.id, loaded.model, loaded.tokenizer)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("hparams", self.hparams())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::models::CompletionRequest;
    use gpt_engine::{Forward, Past, TokenId};
    use gpt_runtime::ScriptedModel;
    use gpt_tokenizer::ByteTokenizer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn engine() -> Arc<Engine> {
        Arc::new(Engine::new(
            "scripted",
            Arc::new(ScriptedModel::from_text("abc", 32)),
            Arc::new(ByteTokenizer::new()),
        ))
    }

    fn params(max_tokens: i64) -> CompletionParams {
        let req = CompletionRequest {
            max_tokens: Some(max_tokens),
            ..Default::default()
        };
        CompletionParams::from_request(req, &Limits::default()).unwrap()
    }

    #[tokio::test]
    async fn run_generates_on_blocking_pool() {
        let choices = engine().run(params(3)).await.unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].text, "abc");
    }

    #[tokio::test]
    async fn concurrent_runs_on_one_engine_both_finish() {
        let engine = engine();
        let (a, b) = tokio::join!(
            Arc::clone(&engine).run(params(4)),
            Arc::clone(&engine).run(params(5))
        );
        assert_eq!(a.unwrap()[0].text, "abca");
        assert_eq!(b.unwrap()[0].text, "abcab");
        assert_eq!(engine.session.available_permits(), 1);
    }

    /// Forward-pass concurrency seen across every model sharing it.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    /// Always predicts byte `a`, holding each forward pass open for a while.
    struct SlowModel {
        hparams: Hyperparameters,
        in_flight: Arc<InFlight>,
    }

    impl SlowModel {
        fn new(in_flight: &Arc<InFlight>) -> Self {
            Self {
                hparams: Hyperparameters {
                    n_vocab: ByteTokenizer::VOCAB_SIZE,
                    n_ctx: 32,
                    n_embd: 8,
                    n_head: 1,
                    n_layer: 1,
                },
                in_flight: Arc::clone(in_flight),
            }
        }
    }

    impl LanguageModel for SlowModel {
        fn hparams(&self) -> &Hyperparameters {
            &self.hparams
        }

        fn forward(&self, tokens: &[TokenId], _past: &Past) -> gpt_engine::Result<Forward> {
            let now = self.in_flight.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.in_flight.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.in_flight.current.fetch_sub(1, Ordering::SeqCst);

            let mut logits = vec![0.0; self.hparams.n_vocab];
            logits[usize::from(b'a')] = 100.0;
            Ok(Forward {
                logits,
                present: Past::from_layers(Vec::new(), tokens.len()),
            })
        }
    }

    fn slow_engine(id: &str, in_flight: &Arc<InFlight>) -> Arc<Engine> {
        Arc::new(Engine::new(
            id,
            Arc::new(SlowModel::new(in_flight)),
            Arc::new(ByteTokenizer::new()),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_engine_runs_one_generation_at_a_time() {
        let in_flight = Arc::new(InFlight::default());
        let engine = slow_engine("slow", &in_flight);
        let (a, b) = tokio::join!(
            Arc::clone(&engine).run(params(3)),
            Arc::clone(&engine).run(params(3))
        );
        assert_eq!(a.unwrap()[0].text, "aaa");
        assert_eq!(b.unwrap()[0].text, "aaa");
        assert_eq!(in_flight.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn distinct_engines_run_in_parallel() {
        let in_flight = Arc::new(InFlight::default());
        let first = slow_engine("first", &in_flight);
        let second = slow_engine("second", &in_flight);
        let (a, b) = tokio::join!(first.run(params(3)), second.run(params(3)));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(in_flight.peak.load(Ordering::SeqCst), 2);
    }
}
