use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::BindResult;
use crate::store::{Capability, DeviceStore};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StateData {
    #[serde(default)]
    pub store: BTreeMap<String, i64>,
    #[serde(default)]
    pub capabilities: BTreeMap<Capability, f64>,
}

/// Device store kept in a yaml file next to the configuration.
pub struct StateFile {
    filename: Utf8PathBuf,
    state: Mutex<StateData>,
}

impl StateFile {
    pub fn load(filename: &Utf8Path) -> BindResult<Self> {
        let state = if filename.is_file() {
            let fd = File::open(filename)?;
            serde_yml::from_reader(fd)?
        } else {
            log::debug!("No state file at {filename}, starting empty");
            StateData::default()
        };

        Ok(Self {
            filename: filename.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    pub async fn snapshot(&self) -> StateData {
        self.state.lock().await.clone()
    }

    fn save(&self, state: &StateData) -> BindResult<()> {
        let tmp = self.filename.with_extension("tmp");

        let mut fd = File::create(&tmp)?;
        fd.write_all(serde_yml::to_string(state)?.as_bytes())?;
        std::fs::rename(&tmp, &self.filename)?;

        Ok(())
    }
}

#[async_trait]
impl DeviceStore for StateFile {
    async fn stored_value(&self, key: &str) -> Option<i64> {
        self.state.lock().await.store.get(key).copied()
    }

    async fn capability_value(&self, cap: Capability) -> Option<f64> {
        self.state.lock().await.capabilities.get(&cap).copied()
    }

    async fn persist(&self, key: &str, value: i64) -> BindResult<()> {
        let mut state = self.state.lock().await;
        if state.store.insert(key.to_string(), value) == Some(value) {
            return Ok(());
        }
        log::debug!("Persisting {key}={value}");
        self.save(&state)
    }

    async fn publish(&self, cap: Capability, value: f64) -> BindResult<()> {
        let mut state = self.state.lock().await;
        state.capabilities.insert(cap, value);
        self.save(&state)
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;

    use crate::backend::statefile::StateFile;
    use crate::store::{Capability, DeviceStore, STORE_KEY_SETPOINT};

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("state.yaml");

        let sf = StateFile::load(&path).unwrap();
        assert_eq!(sf.stored_value(STORE_KEY_SETPOINT).await, None);
        assert_eq!(sf.capability_value(Capability::TargetTemperature).await, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("state.yaml");

        let sf = StateFile::load(&path).unwrap();
        sf.persist(STORE_KEY_SETPOINT, 2230).await.unwrap();
        sf.publish(Capability::TargetTemperature, 22.3).await.unwrap();
        assert!(!path.with_extension("tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("targetSetpointCenti: 2230"));
        assert!(text.contains("target_temperature: 22.3"));

        let sf2 = StateFile::load(&path).unwrap();
        assert_eq!(sf2.snapshot().await, sf.snapshot().await);
        assert_eq!(sf2.stored_value(STORE_KEY_SETPOINT).await, Some(2230));
    }

    #[tokio::test]
    async fn broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("state.yaml");
        std::fs::write(&path, "store: [1, 2").unwrap();

        assert!(StateFile::load(&path).is_err());
    }
}
