use std::fmt::{self, Debug, Write as _};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use object::{Object, ObjectSection, ObjectSymbol, SymbolKind};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors reported when loading or inspecting an [`ExecutableImage`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageError {
    /// The image file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The image file is not a valid executable image.
    #[error(transparent)]
    Parse(#[from] object::Error),

    /// The image defines no symbol with this name.
    #[error("symbol not found in image: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but has no initialized bytes in the image file (e.g. it lives in `.bss`
    /// or is a code symbol).
    #[error("symbol has no initialized data in image: {0}")]
    NoInitializedData(String),
}

/// What a symbol defined by an image refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ImageSymbolKind {
    /// Executable code.
    Code,

    /// Static data.
    Data,

    /// Anything else the image format can describe (thread-local storage, section markers, ...).
    Other,
}

/// A symbol defined by an executable image.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct ImageSymbol {
    /// Symbol name as it appears in the image, without demangling.
    pub name: String,

    /// What the symbol refers to.
    pub kind: ImageSymbolKind,

    /// Address of the symbol in the image address space.
    pub address: u64,

    /// Size of the symbol in bytes. Zero if the image format does not record a size.
    pub size: u64,
}

/// A section of an executable image.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct ImageSection {
    /// Section name, e.g. `.rodata`.
    pub name: String,

    /// Size of the section in memory, in bytes.
    pub size: u64,
}

/// Attributes describing an executable image as a whole.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ImageAttributes {
    /// Container format, e.g. `Elf`, `MachO` or `Pe`.
    pub format: String,

    /// Target architecture, e.g. `X86_64` or `Aarch64`.
    pub architecture: String,

    /// Whether multi-byte values in the image are little-endian.
    pub little_endian: bool,

    /// Whether the image uses 64-bit pointers.
    pub is_64bit: bool,

    /// Build identifier as lowercase hex, if the image carries one.
    pub build_id: Option<String>,
}

/// An executable or shared library image: the unit of deployed code.
///
/// Every query re-reads the image as loaded, nothing derived from it is cached.
pub trait ExecutableImage: Debug + Send + Sync {
    /// File name of the image without its extension.
    fn name(&self) -> String;

    /// Absolute path the image was loaded from.
    fn location(&self) -> &Path;

    /// `file://` URL of the image. `None` if the location cannot be expressed as a URL.
    fn code_base(&self) -> Option<Url>;

    /// Symbols defined by the image.
    ///
    /// # Errors
    ///
    /// Fails with the parse error of the image format.
    fn types(&self) -> Result<Vec<ImageSymbol>, ImageError>;

    /// Sections of the image.
    ///
    /// # Errors
    ///
    /// Fails with the parse error of the image format.
    fn resources(&self) -> Result<Vec<ImageSection>, ImageError>;

    /// Attributes describing the image as a whole.
    ///
    /// # Errors
    ///
    /// Fails with the parse error of the image format.
    fn custom_attributes(&self) -> Result<ImageAttributes, ImageError>;

    /// The defined symbol with this exact name, if any.
    ///
    /// # Errors
    ///
    /// Fails with the parse error of the image format.
    fn get_type(&self, name: &str) -> Result<Option<ImageSymbol>, ImageError>;

    /// The bytes of the section with this name as stored in the image file, if there is such a
    /// section.
    ///
    /// # Errors
    ///
    /// Fails with the parse error of the image format.
    fn resource_data(&self, name: &str) -> Result<Option<Vec<u8>>, ImageError>;

    /// A fresh copy of the initialized bytes of the data symbol with this name.
    ///
    /// # Errors
    ///
    /// Fails if the symbol is not defined or has no initialized bytes in the image file.
    fn create_instance(&self, name: &str) -> Result<Vec<u8>, ImageError>;

    /// Loads another image from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid executable image.
    fn load(&self, path: &Path) -> Result<Self, ImageError>
    where
        Self: Sized;
}

/// An executable image read from the file system and parsed with the `object` crate.
///
/// # Example
///
/// ```rust
/// use platform_seams::{ExecutableImage, SystemImage};
///
/// let image = SystemImage::current().unwrap();
/// let attributes = image.custom_attributes().unwrap();
///
/// println!("{} is a {} image for {}", image.name(), attributes.format, attributes.architecture);
/// ```
#[derive(Clone)]
pub struct SystemImage {
    location: PathBuf,
    data: Arc<[u8]>,
}

impl SystemImage {
    /// The image of the running executable.
    ///
    /// # Errors
    ///
    /// Fails if the path of the running executable cannot be determined or the file cannot be
    /// read or parsed.
    pub fn current() -> Result<Self, ImageError> {
        Self::load_from(std::env::current_exe()?)
    }

    /// The image stored in the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid executable image.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let location = std::path::absolute(path.as_ref())?;
        let data: Arc<[u8]> = Arc::from(std::fs::read(&location)?);

        // Reject files that are not images up front, so later queries only fail on corruption.
        let file = object::File::parse(&*data)?;

        debug!(
            path = %location.display(),
            format = ?file.format(),
            bytes = data.len(),
            "loaded executable image"
        );

        Ok(Self { location, data })
    }

    fn parse(&self) -> Result<object::File<'_>, ImageError> {
        Ok(object::File::parse(&*self.data)?)
    }
}

fn symbol_kind(kind: SymbolKind) -> ImageSymbolKind {
    match kind {
        SymbolKind::Text => ImageSymbolKind::Code,
        SymbolKind::Data => ImageSymbolKind::Data,
        _ => ImageSymbolKind::Other,
    }
}

fn defined_symbols<'data, 'file>(
    file: &'file object::File<'data>,
) -> impl Iterator<Item = object::Symbol<'data, 'file>> {
    file.symbols()
        .chain(file.dynamic_symbols())
        .filter(|symbol| symbol.is_definition())
}

fn to_image_symbol(symbol: &object::Symbol<'_, '_>) -> Result<ImageSymbol, ImageError> {
    Ok(ImageSymbol {
        name: symbol.name()?.to_owned(),
        kind: symbol_kind(symbol.kind()),
        address: symbol.address(),
        size: symbol.size(),
    })
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len().saturating_mul(2)), |mut hex, byte| {
            // Writing to a String cannot fail.
            _ = write!(hex, "{byte:02x}");
            hex
        })
}

impl ExecutableImage for SystemImage {
    fn name(&self) -> String {
        self.location
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn location(&self) -> &Path {
        &self.location
    }

    fn code_base(&self) -> Option<Url> {
        Url::from_file_path(&self.location).ok()
    }

    fn types(&self) -> Result<Vec<ImageSymbol>, ImageError> {
        let file = self.parse()?;

        let mut symbols = Vec::new();

        for symbol in defined_symbols(&file) {
            let symbol = to_image_symbol(&symbol)?;

            if !symbol.name.is_empty() {
                symbols.push(symbol);
            }
        }

        Ok(symbols)
    }

    fn resources(&self) -> Result<Vec<ImageSection>, ImageError> {
        let file = self.parse()?;

        file.sections()
            .map(|section| {
                Ok(ImageSection {
                    name: section.name()?.to_owned(),
                    size: section.size(),
                })
            })
            .collect()
    }

    fn custom_attributes(&self) -> Result<ImageAttributes, ImageError> {
        let file = self.parse()?;

        Ok(ImageAttributes {
            format: format!("{:?}", file.format()),
            architecture: format!("{:?}", file.architecture()),
            little_endian: file.is_little_endian(),
            is_64bit: file.is_64(),
            build_id: file.build_id()?.map(to_hex),
        })
    }

    fn get_type(&self, name: &str) -> Result<Option<ImageSymbol>, ImageError> {
        let file = self.parse()?;

        for symbol in defined_symbols(&file) {
            if symbol.name()? == name {
                return to_image_symbol(&symbol).map(Some);
            }
        }

        Ok(None)
    }

    fn resource_data(&self, name: &str) -> Result<Option<Vec<u8>>, ImageError> {
        let file = self.parse()?;

        let Some(section) = file.section_by_name(name) else {
            return Ok(None);
        };

        Ok(Some(section.data()?.to_vec()))
    }

    fn create_instance(&self, name: &str) -> Result<Vec<u8>, ImageError> {
        let file = self.parse()?;

        let mut found = None;

        for symbol in defined_symbols(&file) {
            if symbol.name()? == name {
                found = Some(symbol);
                break;
            }
        }

        let symbol = found.ok_or_else(|| ImageError::SymbolNotFound(name.to_owned()))?;

        if symbol.kind() != SymbolKind::Data {
            return Err(ImageError::NoInitializedData(name.to_owned()));
        }

        let Some(section_index) = symbol.section_index() else {
            return Err(ImageError::NoInitializedData(name.to_owned()));
        };

        let section = file.section_by_index(section_index)?;

        section
            .data_range(symbol.address(), symbol.size())?
            .filter(|bytes| !bytes.is_empty())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ImageError::NoInitializedData(name.to_owned()))
    }

    fn load(&self, path: &Path) -> Result<Self, ImageError> {
        Self::load_from(path)
    }
}

impl Debug for SystemImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemImage")
            .field("location", &self.location)
            .field("bytes", &self.data.len())
            .finish()
    }
}
