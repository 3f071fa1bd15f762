use crate::{
    host::{Host, HostError},
    plugin::notify::NotificationPublisher,
};
use std::{error::Error, fmt};

const KEY_SUFFIX: &str = "-block-list";

/// Storage key of an owner's block list.
///
/// The suffix is fixed, so distinct owners always map to distinct keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockListKey(String);

impl BlockListKey {
    pub fn new(owner: &str) -> Self {
        Self(format!("{}{}", owner, KEY_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockListKey {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.write_str(&self.0)
    }
}

/// Reads and writes block lists as JSON arrays in the host key/value store.
#[derive(Clone)]
pub struct SilencerStore<H> {
    host: H,
    publisher: NotificationPublisher<H>,
}

impl<H: Host> SilencerStore<H> {
    pub fn new(host: H) -> Self {
        let publisher = NotificationPublisher::new(host.clone());
        Self { host, publisher }
    }

    /// Returns the owner's list, empty if nothing was ever stored.
    ///
    /// A successful read is published when `notify` is set.
    pub async fn read(&self, owner: &str, notify: bool) -> Result<Vec<String>, StoreError> {
        let key = BlockListKey::new(owner);
        let data = self
            .host
            .kv_get(key.as_str())
            .await
            .map_err(|source| StoreError::Read { source, key: key.clone() })?;
        let list = match data {
            Some(data) => serde_json::from_slice(&data).map_err(|source| StoreError::Decode { source, key })?,
            None => {
                log::debug!("No block list stored for {}", owner);
                Vec::new()
            }
        };
        if notify {
            self.publisher.publish(owner, &list);
        }
        Ok(list)
    }

    pub async fn write(&self, owner: &str, list: &[String]) -> Result<(), StoreError> {
        let key = BlockListKey::new(owner);
        let data = serde_json::to_vec(list).map_err(StoreError::Encode)?;
        self.host
            .kv_set(key.as_str(), data)
            .await
            .map_err(|source| StoreError::Persist { source, key })?;
        self.publisher.publish(owner, list);
        Ok(())
    }
}

#[derive(Debug)]
pub enum StoreError {
    Decode { source: serde_json::Error, key: BlockListKey },
    Encode(serde_json::Error),
    Persist { source: HostError, key: BlockListKey },
    Read { source: HostError, key: BlockListKey },
}

impl fmt::Display for StoreError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::StoreError::*;
        match self {
            Decode { source, .. } => write!(out, "Unable to read kv: {}", source),
            Encode(err) => write!(out, "Unable to encode list: {}", err),
            Persist { source, .. } => write!(out, "Unable to save: {}", source),
            Read { source, .. } => write!(out, "Unable to read kv: {}", source),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::StoreError::*;
        Some(match self {
            Decode { source, .. } => source,
            Encode(err) => err,
            Persist { source, .. } => source,
            Read { source, .. } => source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use serde_json::json;

    fn store() -> (MemoryHost, SilencerStore<MemoryHost>) {
        let host = MemoryHost::new();
        (host.clone(), SilencerStore::new(host))
    }

    #[test]
    fn key_format() {
        assert_eq!(BlockListKey::new("u1").as_str(), "u1-block-list");
        assert_ne!(BlockListKey::new("a"), BlockListKey::new("a-"));
    }

    #[tokio::test]
    async fn missing_key_reads_as_empty() {
        let (host, store) = store();
        assert_eq!(store.read("u1", true).await.unwrap(), Vec::<String>::new());
        assert_eq!(host.raw("u1-block-list"), None);
        assert_eq!(host.events()[0].payload, json!({ "list": [] }));
    }

    #[tokio::test]
    async fn write_then_read() {
        let (host, store) = store();
        let list = vec![String::from("bob"), String::from("carol")];
        store.write("u1", &list).await.unwrap();
        assert_eq!(host.raw("u1-block-list").unwrap(), br#"["bob","carol"]"#.to_vec());
        assert_eq!(store.read("u1", false).await.unwrap(), list);
        assert_eq!(host.events().len(), 1);
    }

    #[tokio::test]
    async fn malformed_value_is_a_decode_error() {
        let (host, store) = store();
        host.put_raw("u1-block-list", b"not json".to_vec());
        let err = store.read("u1", true).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert!(host.events().is_empty());
        assert_eq!(host.raw("u1-block-list").unwrap(), b"not json".to_vec());
    }

    #[tokio::test]
    async fn array_of_non_strings_is_a_decode_error() {
        let (host, store) = store();
        host.put_raw("u1-block-list", b"[1, 2]".to_vec());
        assert!(matches!(
            store.read("u1", true).await,
            Err(StoreError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn failed_write_does_not_notify() {
        let (host, store) = store();
        host.fail_writes(true);
        let err = store.write("u1", &[String::from("bob")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Persist { .. }));
        assert!(err.to_string().starts_with("Unable to save"));
        assert!(host.events().is_empty());
    }

    #[tokio::test]
    async fn failed_read_is_reported() {
        let (host, store) = store();
        host.fail_reads(true);
        assert!(matches!(store.read("u1", true).await, Err(StoreError::Read { .. })));
        assert!(host.events().is_empty());
    }
}
