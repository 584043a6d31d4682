//! Traffic-light marker icon.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Popup text attached to every signal marker.
pub const SIGNAL_POPUP: &str = "Traffic Signal";

/// CSS class of the icon container.
pub const SIGNAL_ICON_CLASS: &str = "traffic-signal-icon";

/// Icon size in pixels (square).
pub const SIGNAL_ICON_SIZE: u32 = 24;

const UNLIT_FILL: &str = "#4a5568";

/// Which lamp of the traffic light is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalLamp {
    Red,
    Yellow,
    Green,
}

impl SignalLamp {
    const fn lit_fill(self) -> &'static str {
        match self {
            Self::Red => "#ef4444",
            Self::Yellow => "#fbbf24",
            Self::Green => "#22c55e",
        }
    }
}

/// A marker icon: SVG markup plus placement metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalIcon {
    /// The lit lamp.
    pub lamp: SignalLamp,
    /// Inline SVG markup.
    pub svg: String,
    /// CSS class for the icon container.
    pub class_name: String,
    /// `[width, height]` in pixels.
    pub size: [u32; 2],
    /// Anchor point `[x, y]` in pixels (bottom center).
    pub anchor: [u32; 2],
}

impl SignalIcon {
    /// Builds the icon with `lamp` lit and the other two dimmed.
    #[must_use]
    pub fn new(lamp: SignalLamp) -> Self {
        let lamps = [
            (7, SignalLamp::Red),
            (12, SignalLamp::Yellow),
            (17, SignalLamp::Green),
        ];
        let circles: String = lamps
            .into_iter()
            .map(|(cy, which)| {
                let (fill, opacity) = if which == lamp {
                    (which.lit_fill(), "1")
                } else {
                    (UNLIT_FILL, "0.3")
                };
                format!(
                    "<circle cx=\"12\" cy=\"{cy}\" r=\"2.5\" fill=\"{fill}\" fill-opacity=\"{opacity}\"/>"
                )
            })
            .collect();

        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\" width=\"24\" height=\"24\">\
             <path d=\"M8 2h8a2 2 0 0 1 2 2v16a2 2 0 0 1-2 2H8a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2z\" \
             fill=\"#1a202c\" stroke=\"{UNLIT_FILL}\" stroke-width=\"1\"/>{circles}</svg>"
        );

        Self {
            lamp,
            svg,
            class_name: SIGNAL_ICON_CLASS.to_string(),
            size: [SIGNAL_ICON_SIZE, SIGNAL_ICON_SIZE],
            anchor: [SIGNAL_ICON_SIZE / 2, SIGNAL_ICON_SIZE],
        }
    }

    /// The fixed red-lit icon used for every signal marker.
    #[must_use]
    pub fn red() -> Self {
        Self::new(SignalLamp::Red)
    }
}
