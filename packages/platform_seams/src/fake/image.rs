use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use url::Url;

use crate::{
    ExecutableImage, ImageAttributes, ImageError, ImageSection, ImageSymbol, ImageSymbolKind,
};

/// Where fake symbols are placed in the image address space.
const FIRST_SYMBOL_ADDRESS: u64 = 0x1000;

#[derive(Clone, Debug)]
struct ImageState {
    location: PathBuf,
    symbols: Vec<(ImageSymbol, Option<Vec<u8>>)>,
    sections: Vec<(ImageSection, Vec<u8>)>,
    attributes: ImageAttributes,
    next_address: u64,
}

type Registry = Arc<Mutex<BTreeMap<PathBuf, Arc<ImageState>>>>;

/// An [`ExecutableImage`] with symbols and sections defined by the test.
///
/// Images become loadable through [`ExecutableImage::load()`] once registered with
/// [`register()`][Self::register]. All images loaded from one another share the same registry.
///
/// # Example
///
/// ```
/// use platform_seams::ExecutableImage;
/// use platform_seams::fake::FakeImage;
///
/// let host = FakeImage::new("/opt/app/bin/host");
/// host.register(FakeImage::new("/opt/app/lib/plugin.so").with_data_symbol("GREETING", b"hello"));
///
/// let plugin = host.load("/opt/app/lib/plugin.so".as_ref()).unwrap();
///
/// assert_eq!(plugin.name(), "plugin");
/// assert_eq!(plugin.create_instance("GREETING").unwrap(), b"hello");
/// ```
#[derive(Clone, Debug)]
pub struct FakeImage {
    state: Arc<ImageState>,
    registry: Registry,
}

impl FakeImage {
    /// Creates an empty 64-bit little-endian ELF image for x86-64, located at `location`.
    #[must_use]
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(ImageState {
                location: location.into(),
                symbols: Vec::new(),
                sections: Vec::new(),
                attributes: ImageAttributes {
                    format: "Elf".to_owned(),
                    architecture: "X86_64".to_owned(),
                    little_endian: true,
                    is_64bit: true,
                    build_id: None,
                },
                next_address: FIRST_SYMBOL_ADDRESS,
            }),
            registry: Registry::default(),
        }
    }

    fn with_symbol(
        mut self,
        name: &str,
        kind: ImageSymbolKind,
        size: u64,
        data: Option<Vec<u8>>,
    ) -> Self {
        let state = Arc::make_mut(&mut self.state);

        let symbol = ImageSymbol {
            name: name.to_owned(),
            kind,
            address: state.next_address,
            size,
        };

        state.next_address = state.next_address.saturating_add(size.max(1));
        state.symbols.push((symbol, data));

        self
    }

    /// Adds a data symbol whose initialized bytes are `data`.
    #[must_use]
    pub fn with_data_symbol(self, name: &str, data: &[u8]) -> Self {
        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        self.with_symbol(name, ImageSymbolKind::Data, size, Some(data.to_vec()))
    }

    /// Adds a data symbol of `size` bytes that has no initialized bytes in the image, as for
    /// zero-initialized statics.
    #[must_use]
    pub fn with_uninitialized_symbol(self, name: &str, size: u64) -> Self {
        self.with_symbol(name, ImageSymbolKind::Data, size, None)
    }

    /// Adds a code symbol of `size` bytes.
    #[must_use]
    pub fn with_code_symbol(self, name: &str, size: u64) -> Self {
        self.with_symbol(name, ImageSymbolKind::Code, size, None)
    }

    /// Adds a section with the given contents.
    #[must_use]
    pub fn with_section(mut self, name: &str, data: &[u8]) -> Self {
        let section = ImageSection {
            name: name.to_owned(),
            size: u64::try_from(data.len()).unwrap_or(u64::MAX),
        };

        Arc::make_mut(&mut self.state)
            .sections
            .push((section, data.to_vec()));

        self
    }

    /// Sets the target architecture reported in the image attributes.
    #[must_use]
    pub fn with_architecture(mut self, architecture: &str) -> Self {
        Arc::make_mut(&mut self.state).attributes.architecture = architecture.to_owned();
        self
    }

    /// Sets the build identifier reported in the image attributes, given as lowercase hex.
    #[must_use]
    pub fn with_build_id(mut self, build_id: &str) -> Self {
        Arc::make_mut(&mut self.state).attributes.build_id = Some(build_id.to_owned());
        self
    }

    /// Makes `image` loadable from its location by this image and every image loaded from it.
    pub fn register(&self, image: Self) {
        self.registry
            .lock()
            .expect("fake image registry lock poisoned - cannot continue execution")
            .insert(image.state.location.clone(), image.state);
    }

    fn find_symbol(&self, name: &str) -> Option<&(ImageSymbol, Option<Vec<u8>>)> {
        self.state
            .symbols
            .iter()
            .find(|(symbol, _)| symbol.name == name)
    }
}

impl ExecutableImage for FakeImage {
    fn name(&self) -> String {
        self.state
            .location
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn location(&self) -> &Path {
        &self.state.location
    }

    fn code_base(&self) -> Option<Url> {
        Url::from_file_path(&self.state.location).ok()
    }

    fn types(&self) -> Result<Vec<ImageSymbol>, ImageError> {
        Ok(self
            .state
            .symbols
            .iter()
            .map(|(symbol, _)| symbol.clone())
            .collect())
    }

    fn resources(&self) -> Result<Vec<ImageSection>, ImageError> {
        Ok(self
            .state
            .sections
            .iter()
            .map(|(section, _)| section.clone())
            .collect())
    }

    fn custom_attributes(&self) -> Result<ImageAttributes, ImageError> {
        Ok(self.state.attributes.clone())
    }

    fn get_type(&self, name: &str) -> Result<Option<ImageSymbol>, ImageError> {
        Ok(self.find_symbol(name).map(|(symbol, _)| symbol.clone()))
    }

    fn resource_data(&self, name: &str) -> Result<Option<Vec<u8>>, ImageError> {
        Ok(self
            .state
            .sections
            .iter()
            .find(|(section, _)| section.name == name)
            .map(|(_, data)| data.clone()))
    }

    fn create_instance(&self, name: &str) -> Result<Vec<u8>, ImageError> {
        let (_, data) = self
            .find_symbol(name)
            .ok_or_else(|| ImageError::SymbolNotFound(name.to_owned()))?;

        data.clone()
            .ok_or_else(|| ImageError::NoInitializedData(name.to_owned()))
    }

    fn load(&self, path: &Path) -> Result<Self, ImageError> {
        let state = self
            .registry
            .lock()
            .expect("fake image registry lock poisoned - cannot continue execution")
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no fake image registered at {}", path.display()),
                )
            })?;

        Ok(Self {
            state,
            registry: Arc::clone(&self.registry),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(FakeImage: Send, Sync, Clone);

    fn image() -> FakeImage {
        FakeImage::new("/usr/lib/libdemo.so")
            .with_data_symbol("VERSION", &[1, 2, 3])
            .with_uninitialized_symbol("COUNTER", 8)
            .with_code_symbol("demo_main", 64)
            .with_section(".comment", b"built by hand")
            .with_build_id("abcd")
    }

    #[test]
    fn identity() {
        let image = image();

        assert_eq!(image.name(), "libdemo");
        assert_eq!(image.location(), Path::new("/usr/lib/libdemo.so"));
        assert_eq!(
            image.code_base().expect("absolute path").as_str(),
            "file:///usr/lib/libdemo.so"
        );
    }

    #[test]
    fn symbols_are_laid_out_in_order() {
        let types = image().types().expect("fake cannot fail");

        let names: Vec<_> = types.iter().map(|symbol| symbol.name.as_str()).collect();
        assert_eq!(names, ["VERSION", "COUNTER", "demo_main"]);

        let addresses: Vec<_> = types.iter().map(|symbol| symbol.address).collect();
        assert_eq!(addresses, [0x1000, 0x1003, 0x100b]);
    }

    #[test]
    fn create_instance_copies_initialized_data() {
        let image = image();

        let mut first = image.create_instance("VERSION").expect("initialized");
        first.push(4);

        assert_eq!(image.create_instance("VERSION").expect("initialized"), [1, 2, 3]);
    }

    #[test]
    fn create_instance_failures() {
        let image = image();

        assert!(matches!(
            image.create_instance("COUNTER"),
            Err(ImageError::NoInitializedData(_))
        ));
        assert!(matches!(
            image.create_instance("demo_main"),
            Err(ImageError::NoInitializedData(_))
        ));
        assert!(matches!(
            image.create_instance("missing"),
            Err(ImageError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn sections_and_attributes() {
        let image = image();

        assert_eq!(
            image.resource_data(".comment").expect("fake cannot fail"),
            Some(b"built by hand".to_vec())
        );
        assert!(image.resource_data(".text").expect("fake cannot fail").is_none());

        let attributes = image.custom_attributes().expect("fake cannot fail");
        assert_eq!(attributes.build_id.as_deref(), Some("abcd"));
        assert_eq!(attributes.format, "Elf");
    }

    #[test]
    fn unregistered_path_is_not_found() {
        let error = image()
            .load(Path::new("/usr/lib/other.so"))
            .expect_err("nothing registered");

        let ImageError::Io(error) = error else {
            panic!("expected an I/O error, got {error:?}");
        };
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn loaded_image_shares_registry() {
        let host = FakeImage::new("/bin/host");
        host.register(FakeImage::new("/lib/a.so"));
        host.register(FakeImage::new("/lib/b.so"));

        let a = host.load(Path::new("/lib/a.so")).expect("registered");
        let b = a.load(Path::new("/lib/b.so")).expect("registry is shared");

        assert_eq!(b.name(), "b");
    }
}
