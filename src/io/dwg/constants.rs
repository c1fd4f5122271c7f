//! Constants, sentinel bytes, and magic numbers for the binary container.

/// Section names in locator order.
pub mod section_names {
    /// Header variables (handle seed)
    pub const HEADER: &str = "AcDb:Header";
    /// All entities, table entries, and objects
    pub const ACDB_OBJECTS: &str = "AcDb:AcDbObjects";
    /// Object map (handle -> file offset)
    pub const HANDLES: &str = "AcDb:Handles";

    /// Sections written by this crate, in file order.
    pub const ALL: [&str; 3] = [HEADER, ACDB_OBJECTS, HANDLES];
}

/// Sentinel bytes.
pub mod sentinels {
    /// Marks the end of the file header locator.
    pub const FILE_HEADER_END: [u8; 16] = [
        0x95, 0xA0, 0x4E, 0x28, 0x99, 0x82, 0x1A, 0xE5, 0x5E, 0x41, 0xE0, 0x5F, 0x9D, 0x3A,
        0x4D, 0x00,
    ];
}

/// Object map layout.
pub mod handle_map {
    /// Largest chunk body (size field included) before a new chunk starts.
    pub const MAX_CHUNK_SIZE: usize = 2032;
    /// Size field value of the terminating chunk.
    pub const EMPTY_CHUNK_SIZE: u16 = 2;
}

/// Byte length of the "ACxxxx" magic.
pub const MAGIC_LENGTH: usize = 6;

/// Zero bytes between the magic and the maintenance version.
pub const MAGIC_PADDING: usize = 5;
