//! # Codec Runtime
//!
//! The barcode codec is loaded once and shared. [`CodecRuntime`] owns that
//! load: the first caller of [`CodecRuntime::codec`] runs the
//! [`CodecLoader`], and every caller that arrives while the load is in
//! flight waits for it instead of starting another one. A failed load is
//! not remembered, so the next caller tries again.
//!
//! Load progress is reported through a [`LoadHook`] handed to the loader,
//! never through global state.
//!
//! ```
//! use barstamp::runtime::CodecRuntime;
//!
//! # async fn example() -> barstamp::Result<()> {
//! let runtime = CodecRuntime::shared();
//! let codec = runtime.codec().await?;
//! # let _ = codec;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::codec::{BarcodeCodec, NativeBarcodeCodec};
use crate::error::{BarstampError, Result};

/// Progress of a codec load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Started { source: String },
    Finished { source: String, elapsed: Duration },
    Failed { source: String, reason: String },
}

/// Observer for codec loads.
pub trait LoadHook: Send + Sync {
    fn on_event(&self, event: &LoadEvent);
}

/// Reports load events through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHook;

impl LoadHook for LogHook {
    fn on_event(&self, event: &LoadEvent) {
        match event {
            LoadEvent::Started { source } => log::debug!("loading barcode codec from {}", source),
            LoadEvent::Finished { source, elapsed } => {
                log::info!("barcode codec {} ready in {:?}", source, elapsed)
            }
            LoadEvent::Failed { source, reason } => {
                log::error!("barcode codec {} failed to load: {}", source, reason)
            }
        }
    }
}

/// Produces the barcode codec.
#[async_trait]
pub trait CodecLoader: Send + Sync {
    /// Name reported in load events.
    fn source(&self) -> String;

    async fn load(&self, hook: &dyn LoadHook) -> Result<Arc<dyn BarcodeCodec>>;
}

/// Loader for [`NativeBarcodeCodec`].
#[derive(Debug, Clone, Default)]
pub struct NativeLoader {
    codec: NativeBarcodeCodec,
}

impl NativeLoader {
    pub fn new(codec: NativeBarcodeCodec) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl CodecLoader for NativeLoader {
    fn source(&self) -> String {
        "native".to_string()
    }

    async fn load(&self, _hook: &dyn LoadHook) -> Result<Arc<dyn BarcodeCodec>> {
        Ok(Arc::new(self.codec.clone()))
    }
}

/// Lazily loaded, shared barcode codec.
pub struct CodecRuntime {
    loader: Box<dyn CodecLoader>,
    hook: Arc<dyn LoadHook>,
    codec: OnceCell<Arc<dyn BarcodeCodec>>,
}

impl std::fmt::Debug for CodecRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRuntime")
            .field("source", &self.loader.source())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl CodecRuntime {
    pub fn new(loader: impl CodecLoader + 'static) -> Self {
        Self::with_hook(loader, Arc::new(LogHook))
    }

    pub fn with_hook(loader: impl CodecLoader + 'static, hook: Arc<dyn LoadHook>) -> Self {
        Self {
            loader: Box::new(loader),
            hook,
            codec: OnceCell::new(),
        }
    }

    /// The process-wide runtime using the native codec.
    pub fn shared() -> Arc<CodecRuntime> {
        static SHARED: OnceLock<Arc<CodecRuntime>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(CodecRuntime::new(NativeLoader::default())))
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.codec.initialized()
    }

    /// The loaded codec, loading it first if needed.
    pub async fn codec(&self) -> Result<Arc<dyn BarcodeCodec>> {
        let codec = self
            .codec
            .get_or_try_init(|| async {
                let source = self.loader.source();
                self.hook.on_event(&LoadEvent::Started {
                    source: source.clone(),
                });
                let started = Instant::now();
                match self.loader.load(self.hook.as_ref()).await {
                    Ok(codec) => {
                        self.hook.on_event(&LoadEvent::Finished {
                            source,
                            elapsed: started.elapsed(),
                        });
                        Ok(codec)
                    }
                    Err(e) => {
                        self.hook.on_event(&LoadEvent::Failed {
                            source,
                            reason: e.to_string(),
                        });
                        Err(BarstampError::Runtime(e.to_string()))
                    }
                }
            })
            .await?;
        Ok(codec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts loads, sleeps while loading, fails the first `fail_first` attempts.
    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        fail_first: usize,
    }

    #[async_trait]
    impl CodecLoader for CountingLoader {
        fn source(&self) -> String {
            "counting".to_string()
        }

        async fn load(&self, _hook: &dyn LoadHook) -> Result<Arc<dyn BarcodeCodec>> {
            let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if attempt < self.fail_first {
                return Err(BarstampError::Runtime("module missing".into()));
            }
            Ok(Arc::new(NativeBarcodeCodec::new()))
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        events: Mutex<Vec<LoadEvent>>,
    }

    impl LoadHook for RecordingHook {
        fn on_event(&self, event: &LoadEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runtime = Arc::new(CodecRuntime::new(CountingLoader {
            loads: loads.clone(),
            fail_first: 0,
        }));
        assert!(!runtime.is_loaded());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let runtime = runtime.clone();
            handles.push(tokio::spawn(async move { runtime.codec().await.is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(runtime.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runtime = CodecRuntime::new(CountingLoader {
            loads: loads.clone(),
            fail_first: 1,
        });

        let err = runtime.codec().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Runtime);
        assert!(!runtime.is_loaded());

        assert!(runtime.codec().await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hook_sees_events() {
        let hook = Arc::new(RecordingHook::default());
        let runtime = CodecRuntime::with_hook(NativeLoader::default(), hook.clone());
        runtime.codec().await.unwrap();
        runtime.codec().await.unwrap();

        let events = hook.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            LoadEvent::Started {
                source: "native".into()
            }
        );
        assert!(matches!(events[1], LoadEvent::Finished { .. }));
    }

    #[test]
    fn test_shared_is_one_instance() {
        assert!(Arc::ptr_eq(&CodecRuntime::shared(), &CodecRuntime::shared()));
    }
}
