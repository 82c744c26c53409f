//! Paged memory router.
//!
//! The 64K address space is cut into 1K pages. Each page points into a
//! backing region owned by the map and is either read-write (RAM) or
//! read-only (ROM). Unmapped pages read as `0xFF` and ignore writes.
//!
//! Mapping calls take a base address and a length, both multiples of the
//! page size. Later mappings replace earlier ones page by page.

use crate::Bus;

/// Page granularity of the router.
pub const PAGE_SIZE: usize = 0x400;

const PAGE_COUNT: usize = 0x1_0000 / PAGE_SIZE;

#[derive(Debug, Clone, Copy)]
struct Page {
    region: usize,
    offset: usize,
    writable: bool,
}

/// A byte-addressable router over ROM and RAM regions.
#[derive(Debug, Clone)]
pub struct MemoryMap {
    regions: Vec<Vec<u8>>,
    pages: [Option<Page>; PAGE_COUNT],
}

impl MemoryMap {
    /// Create an empty map: every page unmapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            pages: [None; PAGE_COUNT],
        }
    }

    /// Drop every mapping and backing region.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.pages = [None; PAGE_COUNT];
    }

    /// Map zero-initialised RAM of `len` bytes at `base`.
    ///
    /// Returns the region index, usable with `region()` for inspection.
    ///
    /// # Panics
    ///
    /// Panics if `base` or `len` is not page aligned or the range runs past
    /// the end of the address space.
    pub fn map_ram(&mut self, base: u16, len: usize) -> usize {
        self.map(base, vec![0; len], true)
    }

    /// Map a copy of `data` as ROM at `base`. The mapped length is `data`
    /// rounded up to whole pages; the padding reads as zero.
    ///
    /// # Panics
    ///
    /// Panics if `base` is not page aligned or the range runs past the end
    /// of the address space.
    pub fn map_rom(&mut self, base: u16, data: &[u8]) -> usize {
        let len = data.len().div_ceil(PAGE_SIZE) * PAGE_SIZE;
        let mut region = vec![0; len];
        region[..data.len()].copy_from_slice(data);
        self.map(base, region, false)
    }

    fn map(&mut self, base: u16, region: Vec<u8>, writable: bool) -> usize {
        let base = usize::from(base);
        assert!(base % PAGE_SIZE == 0, "mapping base {base:#06X} not page aligned");
        assert!(region.len() % PAGE_SIZE == 0, "mapping length {:#X} not page aligned", region.len());
        assert!(base + region.len() <= 0x1_0000, "mapping runs past $FFFF");

        let index = self.regions.len();
        for (n, page) in (base / PAGE_SIZE..(base + region.len()) / PAGE_SIZE).enumerate() {
            self.pages[page] = Some(Page {
                region: index,
                offset: n * PAGE_SIZE,
                writable,
            });
        }
        self.regions.push(region);
        index
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        let address = usize::from(address);
        match self.pages[address / PAGE_SIZE] {
            Some(page) => self.regions[page.region][page.offset + address % PAGE_SIZE],
            None => 0xFF,
        }
    }

    /// Whether `address` falls on a read-write page.
    #[must_use]
    pub fn is_writable(&self, address: u16) -> bool {
        self.pages[usize::from(address) / PAGE_SIZE].is_some_and(|p| p.writable)
    }

    /// Backing bytes of a region, for inspection.
    #[must_use]
    pub fn region(&self, index: usize) -> Option<&[u8]> {
        self.regions.get(index).map(Vec::as_slice)
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MemoryMap {
    fn read(&mut self, address: u16) -> u8 {
        self.peek(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        let address = usize::from(address);
        if let Some(page) = self.pages[address / PAGE_SIZE]
            && page.writable
        {
            self.regions[page.region][page.offset + address % PAGE_SIZE] = value;
        }
        // ROM and unmapped writes silently ignored
    }
}
