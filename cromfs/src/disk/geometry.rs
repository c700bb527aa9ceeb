/// Media layouts that can be initialised.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    label: &'static str,
    description: &'static str,
    block_count: u32,
    inode_count: u16,
    first_inode_block: u16,
}

const GEOMETRIES: [Geometry; 5] = [
    Geometry {
        label: "large-ss",
        description: "8\" single sided double density floppy",
        block_count: 1232,
        inode_count: 192,
        first_inode_block: 2,
    },
    Geometry {
        label: "large-ds",
        description: "8\" double sided double density floppy",
        block_count: 2464,
        inode_count: 384,
        first_inode_block: 2,
    },
    Geometry {
        label: "small-ss",
        description: "5.25\" single sided double density floppy",
        block_count: 400,
        inode_count: 64,
        first_inode_block: 2,
    },
    Geometry {
        label: "small-ds",
        description: "5.25\" double sided double density floppy",
        block_count: 800,
        inode_count: 128,
        first_inode_block: 2,
    },
    Geometry {
        label: "hard-disk",
        description: "10 MB hard disk",
        block_count: 20480,
        inode_count: 2048,
        first_inode_block: 2,
    },
];

impl Geometry {
    pub fn from_label(label: &str) -> Option<Self> {
        return GEOMETRIES
            .iter()
            .find(|g| g.label.eq_ignore_ascii_case(label))
            .copied();
    }

    pub fn all() -> &'static [Geometry] {
        return &GEOMETRIES;
    }

    pub fn label(&self) -> &'static str {
        return self.label;
    }

    pub fn description(&self) -> &'static str {
        return self.description;
    }

    pub fn block_count(&self) -> u32 {
        return self.block_count;
    }

    pub fn inode_count(&self) -> u16 {
        return self.inode_count;
    }

    pub fn first_inode_block(&self) -> u16 {
        return self.first_inode_block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let g = Geometry::from_label("LARGE-DS").unwrap();

        assert_eq!(g.block_count(), 2464);
        assert_eq!(g.inode_count(), 384);
        assert!(Geometry::from_label("zip-disk").is_none());
    }

    #[test]
    fn test_inode_tables_fill_whole_blocks() {
        for g in Geometry::all() {
            assert_eq!(g.inode_count() % 4, 0, "{}", g.label());
        }
    }
}
