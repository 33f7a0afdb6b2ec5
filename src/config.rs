use crate::DemoError;

/// Depths the render target understands. Zero is only valid in the platform default sentinel.
pub const SUPPORTED_DEPTHS: [u8; 5] = [1, 2, 4, 8, 16];

/// The deepest depth, the only one using the RGB color encoding.
pub const DEEPEST_BPP: u8 = 16;

/// One display mode, applied atomically to the render target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayConfig {
    pub struct_addr: u16,
    pub data_addr: u16,
    pub region: u8,
    pub plane: u8,
    pub canvas: u8,
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
}

impl DisplayConfig {
    /// Region 0 and plane 0, which every mode of the tour uses.
    pub fn new(
        struct_addr: u16,
        data_addr: u16,
        canvas: u8,
        width: u16,
        height: u16,
        bpp: u8,
    ) -> Result<Self, DemoError> {
        if !SUPPORTED_DEPTHS.contains(&bpp) {
            return Err(DemoError::UnsupportedDepth(bpp));
        }

        Ok(Self {
            struct_addr,
            data_addr,
            region: 0,
            plane: 0,
            canvas,
            width,
            height,
            bpp,
        })
    }

    /// All zero: the render target picks its own defaults.
    pub fn platform_default() -> Self {
        Self::default()
    }

    pub fn is_platform_default(&self) -> bool {
        *self == Self::default()
    }

    /// The five modes in the order they are shown.
    pub fn tour() -> Vec<DisplayConfig> {
        let tour = [
            (3, 640, 480, 1),
            (4, 640, 360, 2),
            (1, 320, 240, 4),
            (0, 0, 0, 0),
            (2, 240, 124, 16),
        ];

        tour.into_iter()
            .map(|(canvas, width, height, bpp)| {
                if bpp == 0 {
                    Self::platform_default()
                } else {
                    Self {
                        struct_addr: 0xFF00,
                        data_addr: 0x0000,
                        region: 0,
                        plane: 0,
                        canvas,
                        width,
                        height,
                        bpp,
                    }
                }
            })
            .collect()
    }

    /// Picks tour entries by position, keeping the requested order.
    pub fn select(tour: &[DisplayConfig], indices: &[usize]) -> Result<Vec<DisplayConfig>, DemoError> {
        indices
            .iter()
            .map(|&index| tour.get(index).copied().ok_or(DemoError::NoSuchMode(index)))
            .collect()
    }
}

impl std::fmt::Display for DisplayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_platform_default() {
            write!(f, "platform default")
        } else {
            write!(
                f,
                "plane={}, canvas={}, w={}, h={}, bpp{}",
                self.plane, self.canvas, self.width, self.height, self.bpp
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tour_ends_on_the_deepest_mode() {
        let tour = DisplayConfig::tour();
        assert_eq!(tour.len(), 5);
        assert!(tour[3].is_platform_default());
        assert_eq!(tour[4].bpp, DEEPEST_BPP);
        assert_eq!((tour[0].width, tour[0].height, tour[0].bpp), (640, 480, 1));
    }

    #[test]
    fn rejects_unknown_depth() {
        assert!(matches!(
            DisplayConfig::new(0xFF00, 0, 1, 320, 240, 3),
            Err(DemoError::UnsupportedDepth(3))
        ));
        assert!(DisplayConfig::new(0xFF00, 0, 1, 320, 240, 8).is_ok());
    }

    #[test]
    fn select_keeps_requested_order() {
        let tour = DisplayConfig::tour();
        let picked = DisplayConfig::select(&tour, &[4, 0]).unwrap();
        assert_eq!(picked, vec![tour[4], tour[0]]);

        assert!(matches!(
            DisplayConfig::select(&tour, &[7]),
            Err(DemoError::NoSuchMode(7))
        ));
    }
}
