//! Asset preloader
//!
//! Critical assets resolve together or not at all; optional assets are
//! fetched best-effort next to them. Each request loads on its own worker
//! thread and reports back over a oneshot channel; [`PreloadHandle`] joins
//! the critical receivers and can be polled without an executor from the
//! frame loop.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};

use tearline_core::{Result, TearlineError};
use tearline_import::{import_gltf, ImportResult};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub path: PathBuf,
    pub kind: AssetKind,
}

impl AssetRequest {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Image,
        }
    }

    pub fn model(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Model,
        }
    }
}

/// RGBA8 pixels of a decoded image
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecodedImage({}x{})", self.width, self.height)
    }
}

impl DecodedImage {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Image(Arc<DecodedImage>),
    Model(Arc<ImportResult>),
}

/// Source of asset bytes. Implementations must be usable from worker threads.
pub trait AssetLoader: Send + Sync {
    fn load(&self, request: &AssetRequest) -> Result<LoadedAsset>;
}

/// Loads images with `image` and models with the glTF importer
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetLoader;

impl AssetLoader for FsAssetLoader {
    fn load(&self, request: &AssetRequest) -> Result<LoadedAsset> {
        let path = &request.path;
        match request.kind {
            AssetKind::Image => {
                let rgba = image::open(path)
                    .map_err(|e| TearlineError::asset(path.display().to_string(), e))?
                    .to_rgba8();
                let (width, height) = rgba.dimensions();
                Ok(LoadedAsset::Image(Arc::new(DecodedImage {
                    width,
                    height,
                    rgba: rgba.into_raw(),
                })))
            }
            AssetKind::Model => {
                let model = import_gltf(path)
                    .map_err(|e| TearlineError::asset(path.display().to_string(), e))?;
                Ok(LoadedAsset::Model(Arc::new(model)))
            }
        }
    }
}

/// Loaded assets keyed by path
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    images: HashMap<PathBuf, Arc<DecodedImage>>,
    models: HashMap<PathBuf, Arc<ImportResult>>,
}

impl AssetStore {
    pub fn insert(&mut self, path: PathBuf, asset: LoadedAsset) {
        match asset {
            LoadedAsset::Image(image) => {
                self.images.insert(path, image);
            }
            LoadedAsset::Model(model) => {
                self.models.insert(path, model);
            }
        }
    }

    pub fn image(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        self.images.get(path).cloned()
    }

    pub fn model(&self, path: &Path) -> Option<Arc<ImportResult>> {
        self.models.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge `other` in, keeping existing entries
    pub fn extend(&mut self, other: AssetStore) {
        for (path, image) in other.images {
            self.images.entry(path).or_insert(image);
        }
        for (path, model) in other.models {
            self.models.entry(path).or_insert(model);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pending preload. The critical future resolves to every critical asset,
/// or to the first critical failure.
pub struct PreloadHandle {
    critical: Option<BoxFuture<'static, Result<AssetStore>>>,
    optional: Arc<Mutex<AssetStore>>,
}

impl PreloadHandle {
    /// Non-blocking check for the frame loop. Yields the outcome once.
    pub fn try_take(&mut self) -> Option<Result<AssetStore>> {
        let outcome = self.critical.as_mut()?.now_or_never()?;
        self.critical = None;
        Some(outcome)
    }

    /// The critical future, for callers that can await it
    pub fn into_critical(self) -> BoxFuture<'static, Result<AssetStore>> {
        match self.critical {
            Some(critical) => critical,
            None => future::ready(Err(TearlineError::Config(
                "preload outcome was already taken".into(),
            )))
            .boxed(),
        }
    }

    /// Optional assets that have loaded so far
    pub fn optional_assets(&self) -> AssetStore {
        lock(&self.optional).clone()
    }
}

/// Load one request on a worker thread. A worker that dies before sending
/// drops its sender, which the receiver reports as a failed load.
fn spawn_load(
    loader: Arc<dyn AssetLoader>,
    request: AssetRequest,
) -> impl Future<Output = Result<(PathBuf, LoadedAsset)>> {
    let (tx, rx) = oneshot::channel();
    let path = request.path.clone();
    std::thread::spawn(move || {
        let result = loader.load(&request).map(|asset| (request.path, asset));
        let _ = tx.send(result);
    });
    rx.map(move |received| match received {
        Ok(result) => result,
        Err(oneshot::Canceled) => Err(TearlineError::asset(
            path.display().to_string(),
            "loader stopped before finishing",
        )),
    })
}

/// Start loading `critical` and `optional` assets in the background
pub fn preload(
    loader: Arc<dyn AssetLoader>,
    critical: Vec<AssetRequest>,
    optional: Vec<AssetRequest>,
) -> PreloadHandle {
    info!(
        "Preloading {} critical and {} optional assets",
        critical.len(),
        optional.len()
    );

    let loads: Vec<_> = critical
        .into_iter()
        .map(|request| spawn_load(Arc::clone(&loader), request))
        .collect();
    let critical = future::try_join_all(loads)
        .map(|joined| match joined {
            Ok(assets) => {
                let mut store = AssetStore::default();
                for (path, asset) in assets {
                    debug!("Loaded critical asset {}", path.display());
                    store.insert(path, asset);
                }
                Ok(store)
            }
            Err(e) => {
                error!("Critical asset failed, sequence will not start: {}", e);
                Err(e)
            }
        })
        .boxed();

    let optional_store = Arc::new(Mutex::new(AssetStore::default()));
    for request in optional {
        let loader = Arc::clone(&loader);
        let store = Arc::clone(&optional_store);
        std::thread::spawn(move || match loader.load(&request) {
            Ok(asset) => lock(&store).insert(request.path, asset),
            Err(e) => debug!("Optional asset skipped: {}", e),
        });
    }

    PreloadHandle {
        critical: Some(critical),
        optional: optional_store,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Serves fixed images by file name; anything else fails
    struct MemoryLoader {
        images: HashMap<PathBuf, (u32, u32)>,
    }

    impl MemoryLoader {
        fn new(entries: &[(&str, u32, u32)]) -> Arc<Self> {
            Arc::new(Self {
                images: entries
                    .iter()
                    .map(|(p, w, h)| (PathBuf::from(p), (*w, *h)))
                    .collect(),
            })
        }
    }

    impl AssetLoader for MemoryLoader {
        fn load(&self, request: &AssetRequest) -> Result<LoadedAsset> {
            match (request.kind, self.images.get(&request.path)) {
                (AssetKind::Image, Some(&(width, height))) => {
                    Ok(LoadedAsset::Image(Arc::new(DecodedImage {
                        width,
                        height,
                        rgba: vec![255; (width * height * 4) as usize],
                    })))
                }
                (AssetKind::Model, Some(_)) => {
                    Ok(LoadedAsset::Model(Arc::new(ImportResult::default())))
                }
                _ => Err(TearlineError::asset(request.path.display().to_string(), "not found")),
            }
        }
    }

    /// Holds every load until released
    struct GatedLoader {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl AssetLoader for GatedLoader {
        fn load(&self, _request: &AssetRequest) -> Result<LoadedAsset> {
            let _ = lock(&self.gate).recv();
            Ok(LoadedAsset::Model(Arc::new(ImportResult::default())))
        }
    }

    #[test]
    fn resolves_when_all_critical_assets_load() {
        let loader = MemoryLoader::new(&[("card.png", 63, 88), ("card.glb", 0, 0)]);
        let handle = preload(
            loader,
            vec![AssetRequest::image("card.png"), AssetRequest::model("card.glb")],
            vec![],
        );
        let store = pollster::block_on(handle.into_critical()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.image(Path::new("card.png")).unwrap().width, 63);
        assert!(store.model(Path::new("card.glb")).is_some());
    }

    #[test]
    fn any_critical_failure_rejects() {
        let loader = MemoryLoader::new(&[("card.png", 4, 4)]);
        let handle = preload(
            loader,
            vec![AssetRequest::image("card.png"), AssetRequest::model("missing.glb")],
            vec![],
        );
        let err = pollster::block_on(handle.into_critical()).unwrap_err();
        assert!(matches!(err, TearlineError::AssetLoad { ref path, .. } if path == "missing.glb"));
    }

    #[test]
    fn optional_failures_are_swallowed() {
        let loader = MemoryLoader::new(&[("card.png", 4, 4), ("logo.png", 2, 2)]);
        let handle = preload(
            loader,
            vec![AssetRequest::image("card.png")],
            vec![AssetRequest::image("missing.png"), AssetRequest::image("logo.png")],
        );
        let optional = Arc::clone(&handle.optional);
        let store = pollster::block_on(handle.into_critical()).unwrap();
        assert_eq!(store.len(), 1);
        // Optional loads never enter the critical store
        assert!(store.image(Path::new("logo.png")).is_none());
        assert!(lock(&optional).image(Path::new("missing.png")).is_none());
    }

    #[test]
    fn no_critical_assets_resolves_immediately() {
        let mut handle = preload(MemoryLoader::new(&[]), vec![], vec![]);
        assert!(matches!(handle.try_take(), Some(Ok(store)) if store.is_empty()));
        assert!(handle.try_take().is_none());
    }

    #[test]
    fn try_take_is_pending_until_loaded() {
        let (release, gate) = mpsc::channel();
        let loader = Arc::new(GatedLoader {
            gate: Mutex::new(gate),
        });
        let mut handle = preload(loader, vec![AssetRequest::model("card.glb")], vec![]);
        assert!(handle.try_take().is_none());

        release.send(()).unwrap();
        let store = pollster::block_on(handle.into_critical()).unwrap();
        assert_eq!(store.len(), 1);
    }

    /// Decodes images but dies on models
    struct PanickingLoader;

    impl AssetLoader for PanickingLoader {
        fn load(&self, request: &AssetRequest) -> Result<LoadedAsset> {
            match request.kind {
                AssetKind::Image => Ok(LoadedAsset::Image(Arc::new(DecodedImage {
                    width: 1,
                    height: 1,
                    rgba: vec![255; 4],
                }))),
                AssetKind::Model => panic!("decoder blew up"),
            }
        }
    }

    #[test]
    fn panicking_critical_loader_rejects() {
        let mut handle = preload(
            Arc::new(PanickingLoader),
            vec![AssetRequest::image("card.png"), AssetRequest::model("card.glb")],
            vec![],
        );

        let mut outcome = None;
        for _ in 0..500 {
            outcome = handle.try_take();
            if outcome.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        let err = outcome.expect("preload settled").unwrap_err();
        assert!(matches!(err, TearlineError::AssetLoad { ref path, .. } if path == "card.glb"));
        assert!(handle.try_take().is_none());
    }

    #[test]
    fn panicking_optional_loader_is_ignored() {
        let handle = preload(
            Arc::new(PanickingLoader),
            vec![AssetRequest::image("card.png")],
            vec![AssetRequest::model("logo.glb")],
        );
        let store = pollster::block_on(handle.into_critical()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn taken_outcome_is_not_repeated() {
        let mut handle = preload(MemoryLoader::new(&[]), vec![], vec![]);
        assert!(handle.try_take().is_some());
        assert!(pollster::block_on(handle.into_critical()).is_err());
    }

    #[test]
    fn fs_loader_decodes_png_and_reports_missing_files() {
        let dir = std::env::temp_dir().join(format!("tearline-preload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let png = dir.join("tiny.png");
        image::RgbaImage::new(3, 2).save(&png).unwrap();

        match FsAssetLoader.load(&AssetRequest::image(&png)).unwrap() {
            LoadedAsset::Image(img) => {
                assert_eq!((img.width, img.height), (3, 2));
                assert_eq!(img.rgba.len(), 3 * 2 * 4);
            }
            other => panic!("expected image, got {:?}", other),
        }

        let missing = FsAssetLoader.load(&AssetRequest::model(dir.join("none.glb")));
        assert!(matches!(missing, Err(TearlineError::AssetLoad { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
