use crate::block::BlockId;
use crate::coords::{local_to_index, LocalPos, CHUNK_VOLUME};

#[derive(Clone, Debug)]
pub struct ChunkData {
    pub blocks: Box<[BlockId; CHUNK_VOLUME]>,
}

impl ChunkData {
    pub fn new_empty() -> Self {
        Self::new_filled(BlockId::AIR)
    }

    pub fn new_filled(block: BlockId) -> Self {
        Self {
            blocks: Box::new([block; CHUNK_VOLUME]),
        }
    }

    pub fn get(&self, local: LocalPos) -> BlockId {
        self.blocks[local_to_index(local)]
    }

    pub fn set(&mut self, local: LocalPos, block: BlockId) {
        self.blocks[local_to_index(local)] = block;
    }

    /// True when every cell holds the same block; such a chunk emits no
    /// interior faces.
    pub fn is_uniform(&self) -> bool {
        let first = self.blocks[0];
        self.blocks.iter().all(|&block| block == first)
    }
}

impl Default for ChunkData {
    fn default() -> Self {
        Self::new_empty()
    }
}
