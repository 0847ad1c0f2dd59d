use crate::types::Color;

use super::bucket;

pub const RAMP_LEN: usize = 9;

/// An ordered color ramp, lightest first.
#[derive(Debug, PartialEq, Eq)]
pub struct Ramp {
    pub colors: [Color; RAMP_LEN],
}

impl Ramp {
    pub fn pick(&self, value: f64, max: f64) -> Color {
        self.colors[bucket(value, max, RAMP_LEN)]
    }
}

const fn ramp(hexes: [u32; RAMP_LEN]) -> Ramp {
    let mut colors = [Color::hex(0); RAMP_LEN];
    let mut i = 0;
    while i < RAMP_LEN {
        colors[i] = Color::hex(hexes[i]);
        i += 1;
    }
    Ramp { colors }
}

pub const BLUES: Ramp = ramp([
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
]);

pub const GREENS: Ramp = ramp([
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
]);

pub const PURPLES: Ramp = ramp([
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
]);

pub const ORANGES: Ramp = ramp([
    0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
]);
