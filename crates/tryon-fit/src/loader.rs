use std::sync::mpsc;
use std::sync::Arc;

use tracing::info;
use tryon_assets::{load_scene, AssetError, AssetSource, SourceFormat};

use crate::active::{ActiveAccessory, LoadTicket};
use crate::calibrate::calibrate;
use crate::error::FitError;

/// A non-blocking handle to an in-flight accessory load.
/// Call `try_recv()` each frame to check for results without blocking the render loop.
pub struct PendingLoad {
    ticket: LoadTicket,
    receiver: mpsc::Receiver<Result<ActiveAccessory, FitError>>,
}

impl PendingLoad {
    /// The request this load answers.
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    /// Non-blocking check for the result. Returns `None` if still pending.
    pub fn try_recv(&self) -> Option<Result<ActiveAccessory, FitError>> {
        self.receiver.try_recv().ok()
    }

    /// Blocking wait for the result.
    pub fn wait(self) -> Result<ActiveAccessory, FitError> {
        self.receiver
            .recv()
            .map_err(|_| FitError::Loader("Channel closed".into()))?
    }
}

/// Read, decode, assemble and calibrate one accessory on the calling thread.
pub fn load_accessory(
    source: &dyn AssetSource,
    id: &str,
    reference_width: f32,
) -> Result<ActiveAccessory, FitError> {
    let path = source.locate(id);
    let declared = SourceFormat::from_path(&path);
    if declared == Some(SourceFormat::Usdz) {
        return Err(AssetError::UnsupportedFormat(path).into());
    }

    let bytes = source.read(id)?;
    if declared.or_else(|| SourceFormat::from_magic(&bytes)) != Some(SourceFormat::Glb) {
        return Err(AssetError::UnsupportedFormat(path).into());
    }

    let scene = load_scene(&bytes)
        .map_err(|e| AssetError::Decode(id.to_string(), e))?
        .with_correction(SourceFormat::Glb);
    let calibration = calibrate(&scene, reference_width)?;

    info!(
        "Loaded accessory '{}': {} nodes, {} instances, base scale {:.3}",
        id,
        scene.nodes().len(),
        scene.instance_count(),
        calibration.base_scale
    );

    Ok(ActiveAccessory {
        id: id.to_string(),
        scene,
        calibration,
    })
}

/// Loads accessories off the frame loop.
/// Owns a background tokio runtime and hands results back via channels.
pub struct AccessoryLoader {
    runtime: tokio::runtime::Runtime,
    source: Arc<dyn AssetSource>,
    reference_width: f32,
}

impl AccessoryLoader {
    /// Create a new loader with a background tokio runtime.
    pub fn new(source: Arc<dyn AssetSource>, reference_width: f32) -> Result<Self, FitError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| FitError::Loader(format!("Failed to create runtime: {}", e)))?;

        Ok(Self {
            runtime,
            source,
            reference_width,
        })
    }

    /// Start loading the accessory for `ticket`. Decoding is CPU-bound and
    /// runs on the blocking pool.
    pub fn load(&self, ticket: LoadTicket) -> PendingLoad {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let reference_width = self.reference_width;
        let id = ticket.id.clone();

        self.runtime.spawn_blocking(move || {
            let result = load_accessory(source.as_ref(), &id, reference_width);
            let _ = tx.send(result);
        });

        PendingLoad {
            ticket,
            receiver: rx,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use crate::active::AccessorySlot;
    use crate::calibrate::tests::container_from_points;

    pub(crate) struct MemorySource(pub(crate) HashMap<String, Vec<u8>>);

    impl AssetSource for MemorySource {
        fn read(&self, id: &str) -> Result<Vec<u8>, AssetError> {
            self.0
                .get(id)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(PathBuf::from(id)))
        }
    }

    pub(crate) fn source() -> Arc<dyn AssetSource> {
        let mut files = HashMap::new();
        files.insert(
            "bob.glb".to_string(),
            container_from_points(&[[-0.1, 0.0, 0.0], [0.1, 0.1, 0.0], [0.0, 0.2, 0.05]]),
        );
        files.insert(
            "curls".to_string(),
            container_from_points(&[[-0.2, 0.0, 0.0], [0.2, 0.1, 0.0], [0.0, 0.3, 0.1]]),
        );
        files.insert("broken.glb".to_string(), b"not a container".to_vec());
        files.insert("notes.txt".to_string(), b"glTF lookalike".to_vec());
        files.insert("afro.usdz".to_string(), vec![0; 16]);
        Arc::new(MemorySource(files))
    }

    fn ticket(id: &str) -> LoadTicket {
        LoadTicket {
            generation: 1,
            id: id.to_string(),
        }
    }

    #[test]
    fn pending_load_try_recv_none_then_result() {
        let (tx, rx) = mpsc::channel();
        let pending = PendingLoad {
            ticket: ticket("bob.glb"),
            receiver: rx,
        };

        assert!(pending.try_recv().is_none());

        tx.send(Err(FitError::DegenerateGeometry)).unwrap();

        let result = pending.try_recv();
        assert!(matches!(result, Some(Err(FitError::DegenerateGeometry))));
    }

    #[test]
    fn pending_load_closed_channel() {
        let (tx, rx) = mpsc::channel::<Result<ActiveAccessory, FitError>>();
        drop(tx);
        let pending = PendingLoad {
            ticket: ticket("bob.glb"),
            receiver: rx,
        };
        assert!(matches!(pending.wait(), Err(FitError::Loader(_))));
    }

    #[test]
    fn loads_and_calibrates_in_background() {
        let loader = AccessoryLoader::new(source(), 0.22).unwrap();
        let accessory = loader.load(ticket("bob.glb")).wait().unwrap();
        assert_eq!(accessory.id, "bob.glb");
        assert!((accessory.calibration.base_scale * 0.2 - 0.22).abs() < 1e-5);
        assert_eq!(accessory.scene.instance_count(), 1);
    }

    #[test]
    fn decode_failure_is_reported() {
        let result = load_accessory(source().as_ref(), "broken.glb", 0.22);
        assert!(matches!(
            result,
            Err(FitError::Asset(AssetError::Decode(_, _)))
        ));

        let result = load_accessory(source().as_ref(), "missing.glb", 0.22);
        assert!(matches!(result, Err(FitError::Asset(AssetError::NotFound(_)))));
    }

    #[test]
    fn usdz_is_rejected() {
        let result = load_accessory(source().as_ref(), "afro.usdz", 0.22);
        assert!(matches!(
            result,
            Err(FitError::Asset(AssetError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn extensionless_container_is_recognized_by_magic() {
        let accessory = load_accessory(source().as_ref(), "curls", 0.22).unwrap();
        assert_eq!(accessory.id, "curls");
        assert!((accessory.calibration.base_scale * 0.4 - 0.22).abs() < 1e-5);

        let result = load_accessory(source().as_ref(), "notes.txt", 0.22);
        assert!(matches!(
            result,
            Err(FitError::Asset(AssetError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn result_feeds_the_slot() {
        let loader = AccessoryLoader::new(source(), 0.22).unwrap();
        let slot = AccessorySlot::new();
        let pending = loader.load(slot.request("bob.glb"));
        let ticket = pending.ticket().clone();
        assert!(slot.complete(&ticket, pending.wait()));
        assert_eq!(slot.current().unwrap().id, "bob.glb");
    }
}
