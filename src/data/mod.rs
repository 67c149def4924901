/// Data layer: tabular model, format detection, loaders and GTI segmentation.
///
/// Architecture:
/// ```text
///   uploaded file
///        │
///        ▼
///   ┌──────────┐
///   │  detect   │  sniff content → ascii_table / binary_table / unknown
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  loader   │  ASCII   │  events   │  FITS events + GTIs
///   └──────────┘          └──────────┘
///        │                      │
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  augment  │ opt-in   │   gti     │  single-pass window scan
///   └──────────┘          └──────────┘
///        │                      │
///        └──────────┬───────────┘
///                   ▼
///           ┌──────────────┐
///           │    Dataset    │  Table → Column (values, error_values)
///           └──────────────┘
/// ```

pub mod augment;
pub mod detect;
pub mod events;
pub mod fits;
pub mod gti;
pub mod loader;
pub mod model;
