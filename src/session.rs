use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::build::{GraphSource, build_graph};
use crate::config::Config;
use crate::ir::QueryTree;
use crate::layout::{
    GraphPayload, LayeredEngine, LayoutError, Strategy, layout_with_engine, layout_with_ranks,
};

/// One complete layout pass. Published as a unit, never patched.
#[derive(Debug, Clone)]
pub struct LayoutSnapshot {
    pub generation: u64,
    pub strategy: Strategy,
    pub payload: GraphPayload,
}

#[derive(Debug, Clone)]
pub enum Refresh {
    Published(Arc<LayoutSnapshot>),
    /// A refresh that started later had already published; this result was discarded.
    Superseded { generation: u64, current: u64 },
}

pub struct LayoutSession {
    engine: Arc<dyn LayeredEngine>,
    config: Config,
    next_generation: AtomicU64,
    published: watch::Sender<Option<Arc<LayoutSnapshot>>>,
}

impl LayoutSession {
    pub fn new(engine: Arc<dyn LayeredEngine>, config: Config) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            engine,
            config,
            next_generation: AtomicU64::new(0),
            published,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Latest published pass, if any. Stale but consistent while a refresh is
    /// in flight.
    pub fn current(&self) -> Option<Arc<LayoutSnapshot>> {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<LayoutSnapshot>>> {
        self.published.subscribe()
    }

    /// Builds and lays out `tree`, then publishes unless a newer refresh got
    /// there first. Overlapping calls are safe; each owns its graph.
    pub async fn refresh(&self, tree: &QueryTree) -> Result<Refresh, LayoutError> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let layout_config = &self.config.layout;
        let graph = build_graph(GraphSource::select(tree), layout_config);

        let (strategy, payload) = match self.config.strategy {
            Strategy::Ranks => (Strategy::Ranks, layout_with_ranks(graph, layout_config)),
            Strategy::Layered => {
                let fallback = self.config.fallback_to_ranks.then(|| graph.clone());
                match layout_with_engine(graph, self.engine.as_ref(), layout_config).await {
                    Ok(payload) => (Strategy::Layered, payload),
                    Err(err) => match fallback {
                        Some(graph) => {
                            tracing::warn!(generation, error = %err, "layered layout failed; using rank layout");
                            (Strategy::Ranks, layout_with_ranks(graph, layout_config))
                        }
                        None => return Err(err),
                    },
                }
            }
        };

        let snapshot = Arc::new(LayoutSnapshot {
            generation,
            strategy,
            payload,
        });
        let mut current = 0;
        let published = self.published.send_if_modified(|slot| {
            current = slot.as_ref().map_or(0, |s| s.generation);
            if current < generation {
                *slot = Some(Arc::clone(&snapshot));
                true
            } else {
                false
            }
        });

        if published {
            tracing::debug!(generation, nodes = snapshot.payload.nodes.len(), "layout published");
            Ok(Refresh::Published(snapshot))
        } else {
            tracing::debug!(generation, current, "discarding superseded layout");
            Ok(Refresh::Superseded {
                generation,
                current,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{QueryEvent, QueryTreeNode};
    use crate::layout::{LayeredResult, LayeredSpec, Point};
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, oneshot};

    /// Each call waits on the next gate; the test decides the resolve order.
    struct GatedEngine {
        gates: Mutex<VecDeque<oneshot::Receiver<LayeredResult>>>,
        started: mpsc::UnboundedSender<()>,
    }

    impl LayeredEngine for GatedEngine {
        fn compute_layout(
            &self,
            _spec: LayeredSpec,
        ) -> BoxFuture<'static, Result<LayeredResult, LayoutError>> {
            let gate = self.gates.lock().unwrap().pop_front();
            let _ = self.started.send(());
            Box::pin(async move {
                match gate {
                    Some(gate) => gate
                        .await
                        .map_err(|_| LayoutError::Engine("gate dropped".to_string())),
                    None => Err(LayoutError::Engine("no gate".to_string())),
                }
            })
        }
    }

    fn layered_config(fallback: bool) -> Config {
        Config {
            strategy: Strategy::Layered,
            fallback_to_ranks: fallback,
            ..Config::default()
        }
    }

    fn tree() -> QueryTree {
        QueryTree {
            root: Some(
                QueryTreeNode::new("root")
                    .with_child(QueryTreeNode::new("a"))
                    .with_child(QueryTreeNode::new("b")),
            ),
            ..QueryTree::default()
        }
    }

    fn root_at(x: f32) -> LayeredResult {
        let mut result = LayeredResult::default();
        result.nodes.insert("root".to_string(), Point::new(x, 0.0));
        result
    }

    fn root_x(snapshot: &LayoutSnapshot) -> f32 {
        snapshot
            .payload
            .nodes
            .iter()
            .find(|node| node.id == "root")
            .expect("root present")
            .position
            .x
    }

    #[tokio::test]
    async fn later_refresh_wins_even_if_it_resolves_first() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let engine = GatedEngine {
            gates: Mutex::new(VecDeque::from([first_rx, second_rx])),
            started: started_tx,
        };
        let session = Arc::new(LayoutSession::new(Arc::new(engine), layered_config(false)));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.refresh(&tree()).await }
        });
        started_rx.recv().await.expect("first call started");
        let second = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.refresh(&tree()).await }
        });
        started_rx.recv().await.expect("second call started");

        second_tx.send(root_at(222.0)).expect("second gate open");
        let second = second.await.expect("task").expect("layout");
        assert!(matches!(second, Refresh::Published(ref s) if s.generation == 2));

        first_tx.send(root_at(111.0)).expect("first gate open");
        let first = first.await.expect("task").expect("layout");
        assert!(matches!(
            first,
            Refresh::Superseded {
                generation: 1,
                current: 2
            }
        ));

        let current = session.current().expect("published");
        assert_eq!(current.generation, 2);
        assert_eq!(root_x(&current), 222.0);
    }

    #[tokio::test]
    async fn failing_engine_falls_back_to_ranks_when_allowed() {
        let (started_tx, _started_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(GatedEngine {
            gates: Mutex::new(VecDeque::new()),
            started: started_tx,
        });

        let lenient = LayoutSession::new(engine.clone(), layered_config(true));
        let outcome = lenient.refresh(&tree()).await.expect("fallback succeeds");
        let Refresh::Published(snapshot) = outcome else {
            panic!("expected a published snapshot");
        };
        assert_eq!(snapshot.strategy, Strategy::Ranks);
        assert_eq!(snapshot.payload.nodes.len(), 3);

        let strict = LayoutSession::new(engine, layered_config(false));
        let err = strict.refresh(&tree()).await.expect_err("failure surfaces");
        assert!(err.to_string().contains("no gate"));
        assert!(strict.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_each_published_pass() {
        let (started_tx, _started_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(GatedEngine {
            gates: Mutex::new(VecDeque::new()),
            started: started_tx,
        });
        let session = LayoutSession::new(engine, Config::default());
        let mut updates = session.subscribe();

        session.refresh(&tree()).await.expect("first pass");
        updates.changed().await.expect("first update");
        assert_eq!(updates.borrow_and_update().as_ref().map(|s| s.generation), Some(1));

        let timeline = QueryTree {
            root: Some(QueryTreeNode::new("placeholder")),
            events: vec![QueryEvent::new("QueryCreated", "t0"), QueryEvent::new("QueryCompleted", "t1")],
            ..QueryTree::default()
        };
        session.refresh(&timeline).await.expect("second pass");
        updates.changed().await.expect("second update");
        let latest = updates.borrow_and_update().clone().expect("snapshot");
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.payload.edges.len(), 1);
    }
}
