use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use zcl::cluster::measurement::temperature;

use crate::device::reconciler::SetpointReconciler;
use crate::device::state::LiveState;
use crate::error::{BindError, BindResult};
use crate::model::setpoint;
use crate::store::ClusterEndpoint;

#[derive(Clone)]
pub struct PollContext {
    pub endpoint: Arc<dyn ClusterEndpoint>,
    pub reconciler: Arc<SetpointReconciler>,
    pub live: Arc<LiveState>,
}

impl PollContext {
    async fn read_temperature(&self, timeout: Duration) -> BindResult<Option<i16>> {
        let attrs = tokio::time::timeout(
            timeout,
            self.endpoint
                .read_attributes(temperature::CLUSTER_ID, &[temperature::MEASURED_VALUE]),
        )
        .await
        .map_err(|_| BindError::ReadTimeout(timeout))??;

        let attr = attrs
            .into_iter()
            .find(|attr| attr.key == temperature::MEASURED_VALUE)
            .ok_or(BindError::MissingAttribute(
                temperature::CLUSTER_ID,
                temperature::MEASURED_VALUE,
            ))?;

        Ok(attr.value.as_i64().and_then(|v| i16::try_from(v).ok()))
    }

    async fn poll(&self, timeout: Duration) {
        let name = self.reconciler.name();

        match self.read_temperature(timeout).await {
            Ok(Some(value)) => {
                if self.live.update_local_temperature(value) {
                    log::debug!("[{name}] Measured temperature {value}");
                } else {
                    log::debug!("[{name}] Measured temperature not available");
                }
            }
            Ok(None) => log::warn!("[{name}] Measured temperature has unexpected type"),
            Err(BindError::ReadTimeout(_)) => {
                log::warn!("[{name}] Thermostat did not answer within {timeout:?}");
            }
            Err(err) => log::warn!("[{name}] Temperature read failed: {err}"),
        }

        log::info!(
            "[{name}] Drift check: setpoint {:.2}°C, heating demand {}%",
            setpoint::to_celsius(self.reconciler.get()),
            self.live.heating_demand()
        );
    }
}

/// Periodic temperature refresh against the bound thermostat. Stops when
/// dropped; an in-flight read is abandoned.
pub struct DriftPoller {
    task: JoinHandle<()>,
}

impl DriftPoller {
    #[must_use]
    pub fn spawn(ctx: PollContext, period: Duration, timeout: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            /* a tick missed during a slow read is dropped, never stacked */
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                ctx.poll(timeout).await;
            }
        });

        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for DriftPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use zcl::attr::{ZclAttr, ZclAttrValue};
    use zcl::cluster::measurement::temperature;

    use crate::device::poller::{DriftPoller, PollContext};
    use crate::device::reconciler::SetpointReconciler;
    use crate::device::state::LiveState;
    use crate::error::{BindError, BindResult};
    use crate::store::ClusterEndpoint;
    use crate::store::memory::MemoryStore;

    const PERIOD: Duration = Duration::from_secs(600);
    const TIMEOUT: Duration = Duration::from_secs(5);

    enum Reply {
        Value(ZclAttrValue),
        Never,
        Fail,
    }

    struct ScriptedEndpoint {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl ScriptedEndpoint {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ClusterEndpoint for ScriptedEndpoint {
        async fn read_attributes(&self, cluster: u16, attrs: &[u16]) -> BindResult<Vec<ZclAttr>> {
            assert_eq!(cluster, temperature::CLUSTER_ID);
            assert_eq!(attrs, &[temperature::MEASURED_VALUE]);
            self.calls.fetch_add(1, Ordering::SeqCst);

            match &self.reply {
                Reply::Value(value) => Ok(vec![ZclAttr::new(temperature::MEASURED_VALUE, value.clone())]),
                Reply::Never => futures::future::pending().await,
                Reply::Fail => Err(BindError::TransportClosed),
            }
        }
    }

    async fn context(endpoint: Arc<ScriptedEndpoint>) -> PollContext {
        let store = Arc::new(MemoryStore::default());
        PollContext {
            endpoint,
            reconciler: Arc::new(SetpointReconciler::restore("test", store, 2000).await),
            live: Arc::new(LiveState::new()),
        }
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_after_one_period() {
        let endpoint = ScriptedEndpoint::new(Reply::Value(ZclAttrValue::I16(2150)));
        let ctx = context(endpoint.clone()).await;
        let live = ctx.live.clone();

        let _poller = DriftPoller::spawn(ctx, PERIOD, TIMEOUT);

        advance(599).await;
        assert_eq!(endpoint.calls(), 0);
        assert_eq!(live.local_temperature(), None);

        advance(2).await;
        assert_eq!(endpoint.calls(), 1);
        assert_eq!(live.local_temperature(), Some(2150));

        advance(600).await;
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_does_not_block_next_tick() {
        let endpoint = ScriptedEndpoint::new(Reply::Never);
        let ctx = context(endpoint.clone()).await;
        let live = ctx.live.clone();
        live.update_local_temperature(1900);

        let _poller = DriftPoller::spawn(ctx, PERIOD, TIMEOUT);

        advance(601).await;
        assert_eq!(endpoint.calls(), 1);

        advance(10).await;
        assert_eq!(live.local_temperature(), Some(1900));

        advance(600).await;
        assert_eq!(endpoint.calls(), 2);
        assert_eq!(live.local_temperature(), Some(1900));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_and_sentinel_keep_cache() {
        let failing = ScriptedEndpoint::new(Reply::Fail);
        let ctx = context(failing.clone()).await;
        ctx.live.update_local_temperature(2000);
        let live = ctx.live.clone();

        let poller = DriftPoller::spawn(ctx.clone(), PERIOD, TIMEOUT);
        advance(601).await;
        assert_eq!(failing.calls(), 1);
        assert_eq!(live.local_temperature(), Some(2000));
        drop(poller);

        let sentinel = ScriptedEndpoint::new(Reply::Value(ZclAttrValue::I16(i16::MIN)));
        let ctx = PollContext {
            endpoint: sentinel.clone(),
            ..ctx
        };
        let _poller = DriftPoller::spawn(ctx, PERIOD, TIMEOUT);
        advance(601).await;
        assert_eq!(sentinel.calls(), 1);
        assert_eq!(live.local_temperature(), Some(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let endpoint = ScriptedEndpoint::new(Reply::Value(ZclAttrValue::I16(2150)));
        let ctx = context(endpoint.clone()).await;

        let poller = DriftPoller::spawn(ctx, PERIOD, TIMEOUT);
        advance(601).await;
        assert_eq!(endpoint.calls(), 1);

        drop(poller);
        advance(3600).await;
        assert_eq!(endpoint.calls(), 1);
    }
}
