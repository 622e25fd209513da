//! iPhoto catalog index
//!
//! Wraps the parsed `AlbumData.xml` and exposes the pieces the exporter
//! walks: the rolls under `List of Rolls`, the image IDs of each roll's
//! `KeyList`, and the image records in `Master Image List`.

use crate::error::{Error, Result};
use crate::plist::{ARRAY, DICT, Document, Node, STRING};
use std::path::Path;
use tracing::{Level, info, span};

pub const LIST_OF_ROLLS: &str = "List of Rolls";
pub const MASTER_IMAGE_LIST: &str = "Master Image List";
pub const ROLL_NAME: &str = "RollName";
pub const ROLL_ID: &str = "RollID";
pub const KEY_LIST: &str = "KeyList";
pub const IMAGE_PATH: &str = "ImagePath";
pub const DATE_AS_TIMER_INTERVAL: &str = "DateAsTimerInterval";

/// Read-only index over a loaded catalog
#[derive(Debug)]
pub struct CatalogIndex {
    document: Document,
    /// Position of the `List of Rolls` array among the root's children
    rolls: usize,
    /// Position of the `Master Image List` dictionary among the root's children
    master_images: usize,
}

impl CatalogIndex {
    /// Load and index the catalog at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let _span = span!(Level::INFO, "catalog_load").entered();

        let index = Self::from_document(Document::load(path)?)?;
        info!(
            ?path,
            albums = index.album_count(),
            images = index.image_count(),
            "Loaded catalog"
        );
        Ok(index)
    }

    /// Index an already parsed document
    ///
    /// Both root lists are resolved here once; a catalog without them is
    /// unusable, so their absence is an error rather than an empty export.
    pub fn from_document(document: Document) -> Result<Self> {
        let root = document.root();
        let rolls = root_position(root, LIST_OF_ROLLS, ARRAY)?;
        let master_images = root_position(root, MASTER_IMAGE_LIST, DICT)?;

        Ok(Self {
            document,
            rolls,
            master_images,
        })
    }

    fn rolls(&self) -> &Node {
        &self.document.root().children()[self.rolls]
    }

    fn master_images(&self) -> &Node {
        &self.document.root().children()[self.master_images]
    }

    /// Albums in catalog order
    pub fn albums(&self) -> Vec<Album<'_>> {
        self.rolls()
            .element_children_named(DICT)
            .enumerate()
            .map(|(position, node)| Album { node, position })
            .collect()
    }

    /// Image IDs of `album` in display order, duplicates kept
    pub fn images_of<'a>(&self, album: &Album<'a>) -> Result<Vec<&'a str>> {
        album.key_list()
    }

    /// Image record for `image_id` from the master image list
    pub fn image_info(&self, image_id: &str) -> Result<ImageRecord<'_>> {
        match self.master_images().value_for_key(image_id) {
            Ok(node) => Ok(ImageRecord {
                id: image_id.to_string(),
                node,
            }),
            Err(Error::KeyNotFound { .. }) | Err(Error::MalformedPair { .. }) => {
                Err(Error::ImageNotFound {
                    image_id: image_id.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Number of albums in the roll list
    pub fn album_count(&self) -> usize {
        self.rolls().element_children_named(DICT).count()
    }

    /// Number of distinct image IDs in the master image list
    pub fn image_count(&self) -> usize {
        self.master_images().key_count()
    }
}

fn root_position(root: &Node, key: &str, expected: &'static str) -> Result<usize> {
    let position = root.value_position(key)?;
    let node = &root.children()[position];
    if !node.is(expected) {
        return Err(Error::UnexpectedNode {
            key: key.to_string(),
            expected,
            found: node.name().to_string(),
        });
    }
    Ok(position)
}

/// A roll dictionary from `List of Rolls`
#[derive(Debug, Clone, Copy)]
pub struct Album<'a> {
    node: &'a Node,
    position: usize,
}

impl<'a> Album<'a> {
    /// Raw album name (`RollName`)
    pub fn name(&self) -> Result<&'a str> {
        Ok(self.node.typed_value_for_key(ROLL_NAME, STRING)?.text())
    }

    /// iPhoto's roll identifier, when present
    pub fn roll_id(&self) -> Option<&'a str> {
        self.node
            .value_for_key(ROLL_ID)
            .ok()
            .map(|node| node.text().trim())
    }

    /// Zero-based position among the catalog's albums
    pub fn position(&self) -> usize {
        self.position
    }

    /// Image IDs listed in `KeyList`
    pub fn key_list(&self) -> Result<Vec<&'a str>> {
        let list = self.node.typed_value_for_key(KEY_LIST, ARRAY)?;
        Ok(list
            .element_children_named(STRING)
            .map(|node| node.text().trim())
            .collect())
    }
}

/// An image dictionary from `Master Image List`
#[derive(Debug, Clone)]
pub struct ImageRecord<'a> {
    id: String,
    node: &'a Node,
}

impl<'a> ImageRecord<'a> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of the original image file
    pub fn image_path(&self) -> Result<&'a Path> {
        let path = self
            .node
            .value_for_key(IMAGE_PATH)
            .map(|node| node.text().trim())
            .unwrap_or_default();

        if path.is_empty() {
            return Err(Error::MissingImagePath {
                image_id: self.id.clone(),
            });
        }
        Ok(Path::new(path))
    }

    /// Seconds since the iPhoto epoch (`DateAsTimerInterval`)
    pub fn timer_interval(&self) -> Result<f64> {
        let raw = self
            .node
            .value_for_key(DATE_AS_TIMER_INTERVAL)
            .map(|node| node.text().trim())
            .unwrap_or_default();

        match raw.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => Ok(seconds),
            _ => Err(Error::InvalidTimestamp {
                image_id: self.id.clone(),
                value: raw.to_string(),
            }),
        }
    }
}
