//! JSON-lines transport between the zigbee coordinator and the device.
//!
//! Every line on stdin/stdout is one record:
//!
//! ```text
//! {"type":"zcl","cluster":"0201","data":"055e1007e0000807ff"}
//! {"type":"capability","capability":"target_temperature","value":22.3}
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use packed_struct::PrimitiveEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::select;
use tokio::sync::{mpsc, oneshot};

use zcl::attr::{ZclAttr, ZclCommand, ZclReadAttr, ZclReadAttrResp};
use zcl::frame::{ZclFrame, ZclFrameDirection, ZclFrameType};

use crate::backend::Backend;
use crate::device::ThermostatDevice;
use crate::error::{BindError, BindResult};
use crate::store::{Capability, ClusterEndpoint};

pub fn u16_hex<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    u16::from_str_radix(&s, 16).map_err(serde::de::Error::custom)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn u16_hex_ser<S>(value: &u16, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{value:04x}"))
}

pub fn vec_hex<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    hex::decode(s).map_err(serde::de::Error::custom)
}

pub fn vec_hex_ser<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&hex::encode(value))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Zcl {
        #[serde(deserialize_with = "u16_hex", serialize_with = "u16_hex_ser")]
        cluster: u16,
        #[serde(deserialize_with = "vec_hex", serialize_with = "vec_hex_ser")]
        data: Vec<u8>,
    },
    Capability {
        capability: Capability,
        value: Value,
    },
}

type PendingMap = HashMap<u8, oneshot::Sender<Vec<ZclAttr>>>;

/// Remote reads issued over stdout, answered by read responses on stdin.
pub struct StdioEndpoint {
    seqnr: AtomicU8,
    pending: Mutex<PendingMap>,
    outbound: mpsc::UnboundedSender<Record>,
}

/// Deregisters a pending read when the reader goes away, answered or not.
struct PendingRead<'a> {
    endpoint: &'a StdioEndpoint,
    seqnr: u8,
}

impl Drop for PendingRead<'_> {
    fn drop(&mut self) {
        self.endpoint.pending().remove(&self.seqnr);
    }
}

impl StdioEndpoint {
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Record>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let endpoint = Self {
            seqnr: AtomicU8::new(0),
            pending: Mutex::new(HashMap::new()),
            outbound,
        };
        (Arc::new(endpoint), rx)
    }

    fn pending(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a read response to the remote read waiting for it. Returns
    /// false if the frame is not a read response, so the caller can pass it
    /// on to the device.
    pub fn resolve(&self, data: &[u8]) -> BindResult<bool> {
        let mut cur = Cursor::new(data);
        let frame = ZclFrame::parse(&mut cur)?;

        if frame.cluster_specific() || frame.cmd != ZclCommand::ReadAttribResp.to_primitive() {
            return Ok(false);
        }

        let payload = usize::try_from(cur.position())
            .ok()
            .and_then(|pos| data.get(pos..))
            .unwrap_or_default();

        let Some(tx) = self.pending().remove(&frame.seqnr) else {
            log::warn!("Dropping late read response (seq {})", frame.seqnr);
            return Ok(true);
        };

        let resp = ZclReadAttrResp::parse(payload)?;
        if tx.send(resp.attr).is_err() {
            log::debug!("Reader for seq {} went away", frame.seqnr);
        }

        Ok(true)
    }
}

#[async_trait]
impl ClusterEndpoint for StdioEndpoint {
    async fn read_attributes(&self, cluster: u16, attrs: &[u16]) -> BindResult<Vec<ZclAttr>> {
        let seqnr = self.seqnr.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        self.pending().insert(seqnr, tx);
        let _pending = PendingRead {
            endpoint: self,
            seqnr,
        };

        let mut data = vec![];
        ZclFrame::new(
            ZclFrameType::ProfileWide,
            ZclFrameDirection::ClientToServer,
            None,
            seqnr,
            ZclCommand::ReadAttrib.to_primitive(),
        )
        .pack(&mut data)?;
        ZclReadAttr {
            attr: attrs.to_vec(),
        }
        .pack(&mut data)?;

        self.outbound
            .send(Record::Zcl { cluster, data })
            .map_err(|_| BindError::TransportClosed)?;

        rx.await.map_err(|_| BindError::TransportClosed)
    }
}

pub struct StdioBackend<R, W> {
    device: ThermostatDevice,
    endpoint: Arc<StdioEndpoint>,
    outbound: mpsc::UnboundedReceiver<Record>,
    input: Lines<BufReader<R>>,
    output: W,
}

impl<R, W> StdioBackend<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        device: ThermostatDevice,
        endpoint: Arc<StdioEndpoint>,
        outbound: mpsc::UnboundedReceiver<Record>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            device,
            endpoint,
            outbound,
            input: BufReader::new(input).lines(),
            output,
        }
    }

    async fn write(&mut self, record: &Record) -> BindResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.output.write_all(line.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn handle_zcl(&mut self, cluster: u16, data: &[u8]) -> BindResult<()> {
        if self.endpoint.resolve(data)? {
            return Ok(());
        }

        if let Some(reply) = self.device.handle_frame(cluster, data).await? {
            self.write(&Record::Zcl {
                cluster,
                data: reply,
            })
            .await?;
        }

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> BindResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match serde_json::from_str(line)? {
            Record::Zcl { cluster, data } => self.handle_zcl(cluster, &data).await,
            Record::Capability { capability, value } => {
                self.device.handle_capability(capability, &value).await;
                Ok(())
            }
        }
    }

    /// Process input until it closes. Returns the output sink.
    pub async fn run(mut self) -> BindResult<W> {
        loop {
            select! {
                line = self.input.next_line() => {
                    let Some(line) = line? else {
                        log::info!("Input closed");
                        break;
                    };
                    /* a bad line never stops the device */
                    if let Err(err) = self.handle_line(&line).await {
                        log::warn!("Failed to handle input {line:?}: {err}");
                    }
                }
                Some(record) = self.outbound.recv() => {
                    self.write(&record).await?;
                }
            }
        }

        self.device.shutdown();

        Ok(self.output)
    }
}

#[async_trait]
impl<R, W> Backend for StdioBackend<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn run_forever(self) -> BindResult<()> {
        self.run().await?;
        Ok(())
    }
}
