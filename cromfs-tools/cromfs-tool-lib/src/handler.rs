use crate::error::ToolError;
use cromfs::{BlockDevice, BLOCK_SIZE};
use log::debug;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

const SUPER_BLOCK: u32 = 1;
const SIGNATURE_OFFSET: usize = SUPER_BLOCK as usize * BLOCK_SIZE + 2;
const SIGNATURE: &[u8] = b"cromix";

/// A flat image: every block stored in order, the super-block in block 1. The whole image is
/// held in memory and only written back by `persist`.
pub struct Handler {
    path: PathBuf,
    image: Vec<u8>,
}

impl Handler {
    /// This will create a new zeroed image of the specified number of blocks
    pub fn new_create(path: &str, blocks: u32) -> Result<Self, ToolError> {
        let mut handler = Self {
            path: PathBuf::from(path),
            image: vec![0u8; blocks as usize * BLOCK_SIZE],
        };

        handler.persist()?;

        return Ok(handler);
    }

    // Opens an image
    pub fn new(path: &str) -> Result<Self, ToolError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                return Err(ToolError::new(&format!(
                    "Failed to open file {}. Error: {}",
                    path, e
                )))
            }
        };

        let mut image = Vec::new();

        match file.read_to_end(&mut image) {
            Ok(_) => (),
            Err(e) => return Err(ToolError::new(&format!("Failed to read image. Error: {}", e))),
        }

        if image.len() < 2 * BLOCK_SIZE {
            return Err(ToolError::new(&format!(
                "{} is too small to hold a super-block",
                path
            )));
        }

        // A trailing partial block is ignored.
        image.truncate(image.len() / BLOCK_SIZE * BLOCK_SIZE);

        debug!("{}: {} blocks read", path, image.len() / BLOCK_SIZE);

        return Ok(Self {
            path: PathBuf::from(path),
            image,
        });
    }

    fn range(&self, number: u32) -> Result<std::ops::Range<usize>, ToolError> {
        if number >= self.block_count() {
            return Err(ToolError::new(&format!(
                "Block {} is beyond the end of the image",
                number
            )));
        }

        let start = number as usize * BLOCK_SIZE;

        return Ok(start..start + BLOCK_SIZE);
    }
}

impl BlockDevice<ToolError> for Handler {
    fn super_block(&self) -> Result<Vec<u8>, ToolError> {
        return self.read_block(SUPER_BLOCK);
    }

    fn read_block(&self, number: u32) -> Result<Vec<u8>, ToolError> {
        return Ok(self.image[self.range(number)?].to_vec());
    }

    fn write_block(&mut self, number: u32, bytes: &[u8]) -> Result<(), ToolError> {
        if bytes.len() != BLOCK_SIZE {
            return Err(ToolError::new(&format!(
                "Expected {} bytes for block {}, got {}",
                BLOCK_SIZE,
                number,
                bytes.len()
            )));
        }

        let range = self.range(number)?;
        self.image[range].copy_from_slice(bytes);

        return Ok(());
    }

    fn flush_super_block(&mut self, bytes: &[u8]) -> Result<(), ToolError> {
        return self.write_block(SUPER_BLOCK, bytes);
    }

    fn format_label(&self) -> String {
        return String::from("flat");
    }

    fn block_count(&self) -> u32 {
        return (self.image.len() / BLOCK_SIZE) as u32;
    }

    fn persist(&mut self) -> Result<(), ToolError> {
        let mut file = match File::create(&self.path) {
            Ok(f) => f,
            Err(e) => return Err(ToolError::new(&format!("Failed to create. Error: {}", e))),
        };

        match file.write_all(&self.image) {
            Ok(_) => (),
            Err(e) => return Err(ToolError::new(&format!("Failed to write image. Error: {}", e))),
        }

        debug!("{}: image written", self.path.display());

        return Ok(());
    }
}

/// The image format whose signature the bytes carry, if any.
pub fn detect_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= SIGNATURE_OFFSET + SIGNATURE.len()
        && &bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE.len()] == SIGNATURE
    {
        return Some("flat");
    }

    return None;
}

/// Opens an image with the device matching its detected format.
pub fn open_image(path: &str) -> Result<Box<dyn BlockDevice<ToolError>>, ToolError> {
    let handler = Handler::new(path)?;

    return match detect_format(&handler.image) {
        Some("flat") => Ok(Box::new(handler)),
        _ => Err(ToolError::new(&format!(
            "{} is not a recognised CROMIX image",
            path
        ))),
    };
}
