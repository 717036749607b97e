//! Named CRC models.
//!
//! The orchestrator only sees the [`PresetMatcher`] trait, consulted after
//! parameters have been fully verified. [`Catalogue`] is a built-in table of
//! non-reflected models; [`NoPresets`] matches nothing.

use serde::Serialize;

/// Position of a model within a matcher's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PresetIndex(pub usize);

/// Maps discovered parameters onto a known model.
pub trait PresetMatcher {
    fn match_preset(
        &self,
        width: u8,
        poly: u64,
        init: u64,
        xorout: u64,
        reflected: bool,
    ) -> Option<PresetIndex>;

    /// Human-readable name of a previously matched model.
    fn preset_name(&self, _index: PresetIndex) -> Option<&str> {
        None
    }
}

/// Matcher that never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPresets;

impl PresetMatcher for NoPresets {
    fn match_preset(&self, _: u8, _: u64, _: u64, _: u64, _: bool) -> Option<PresetIndex> {
        None
    }
}

/// A catalogued CRC model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub width: u8,
    pub poly: u64,
    pub init: u64,
    pub xorout: u64,
    /// CRC of the ASCII string `"123456789"`.
    pub check: u64,
}

impl Preset {
    const fn new(name: &'static str, width: u8, poly: u64, init: u64, xorout: u64, check: u64) -> Self {
        Self {
            name,
            width,
            poly,
            init,
            xorout,
            check,
        }
    }

    fn matches(&self, width: u8, poly: u64, init: u64, xorout: u64) -> bool {
        self.width == width && self.poly == poly && self.init == init && self.xorout == xorout
    }
}

const MODELS: &[Preset] = &[
    Preset::new("CRC-5/EPC-C1G2", 5, 0x09, 0x09, 0x00, 0x00),
    Preset::new("CRC-8/SMBUS", 8, 0x07, 0x00, 0x00, 0xf4),
    Preset::new("CRC-8/I-432-1", 8, 0x07, 0x00, 0x55, 0xa1),
    Preset::new("CRC-16/XMODEM", 16, 0x1021, 0x0000, 0x0000, 0x31c3),
    Preset::new("CRC-16/IBM-3740", 16, 0x1021, 0xffff, 0x0000, 0x29b1),
    Preset::new("CRC-16/GENIBUS", 16, 0x1021, 0xffff, 0xffff, 0xd64e),
    Preset::new("CRC-16/UMTS", 16, 0x8005, 0x0000, 0x0000, 0xfee8),
    Preset::new("CRC-16/CMS", 16, 0x8005, 0xffff, 0x0000, 0xaee7),
    Preset::new("CRC-16/DECT-X", 16, 0x0589, 0x0000, 0x0000, 0x007f),
    Preset::new("CRC-24/OPENPGP", 24, 0x86_4cfb, 0xb7_04ce, 0x00_0000, 0x21_cf02),
    Preset::new("CRC-32/BZIP2", 32, 0x04c1_1db7, 0xffff_ffff, 0xffff_ffff, 0xfc89_1918),
    Preset::new("CRC-32/MPEG-2", 32, 0x04c1_1db7, 0xffff_ffff, 0x0000_0000, 0x0376_e6e7),
    Preset::new("CRC-32/CKSUM", 32, 0x04c1_1db7, 0x0000_0000, 0xffff_ffff, 0x765e_7680),
];

/// Built-in table of non-reflected CRC models.
#[derive(Debug, Clone, Copy)]
pub struct Catalogue {
    models: &'static [Preset],
}

impl Default for Catalogue {
    fn default() -> Self {
        Self { models: MODELS }
    }
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: PresetIndex) -> Option<&'static Preset> {
        self.models.get(index.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Preset> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Index of the model called `name`, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<PresetIndex> {
        self.models
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(PresetIndex)
    }
}

impl PresetMatcher for Catalogue {
    fn match_preset(
        &self,
        width: u8,
        poly: u64,
        init: u64,
        xorout: u64,
        reflected: bool,
    ) -> Option<PresetIndex> {
        if reflected {
            return None;
        }
        self.models
            .iter()
            .position(|p| p.matches(width, poly, init, xorout))
            .map(PresetIndex)
    }

    fn preset_name(&self, index: PresetIndex) -> Option<&str> {
        self.get(index).map(|p| p.name)
    }
}
