// style.rs

/// Named palette shared by the PNG renderer and the terminal preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapColor {
    Black,
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Gray,
}

impl MapColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            MapColor::Black => (0, 0, 0),
            MapColor::Blue => (0, 0, 255),
            MapColor::Green => (0, 128, 0),
            MapColor::Red => (255, 0, 0),
            MapColor::Orange => (255, 165, 0),
            MapColor::Purple => (128, 0, 128),
            MapColor::Gray => (128, 128, 128),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MapColor::Black => "black",
            MapColor::Blue => "blue",
            MapColor::Green => "green",
            MapColor::Red => "red",
            MapColor::Orange => "orange",
            MapColor::Purple => "purple",
            MapColor::Gray => "gray",
        }
    }
}

/// Stroke color and weight. For point layers the weight is the marker radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    pub color: MapColor,
    pub weight: u32,
}

impl Style {
    pub const fn new(color: MapColor, weight: u32) -> Self {
        Style { color, weight }
    }
}

pub const BOUNDARY_STYLE: Style = Style::new(MapColor::Black, 1);
pub const HABITATION_STYLE: Style = Style::new(MapColor::Orange, 4);

/// Rural-road funding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Pmgsy,
    Mmgsy,
    Proposed,
    Other,
}

impl Scheme {
    pub fn classify(value: Option<&str>) -> Self {
        match value {
            Some("PMGSY") => Scheme::Pmgsy,
            Some("MMGSY") => Scheme::Mmgsy,
            Some("Proposed") => Scheme::Proposed,
            _ => Scheme::Other,
        }
    }

    pub fn style(self) -> Style {
        match self {
            Scheme::Pmgsy => Style::new(MapColor::Blue, 3),
            Scheme::Mmgsy => Style::new(MapColor::Green, 3),
            Scheme::Proposed => Style::new(MapColor::Red, 3),
            Scheme::Other => Style::new(MapColor::Gray, 2),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scheme::Pmgsy => "PMGSY",
            Scheme::Mmgsy => "MMGSY",
            Scheme::Proposed => "Proposed",
            Scheme::Other => "Other",
        }
    }
}

pub fn scheme_style(value: Option<&str>) -> Style {
    Scheme::classify(value).style()
}

/// Arterial network class, read off the road-number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArterialClass {
    National,
    State,
    MajorDistrict,
    Other,
}

impl ArterialClass {
    pub fn classify(road_number: Option<&str>) -> Self {
        match road_number.unwrap_or("") {
            n if n.starts_with("NH") => ArterialClass::National,
            n if n.starts_with("SH") => ArterialClass::State,
            n if n.starts_with("MDR") => ArterialClass::MajorDistrict,
            _ => ArterialClass::Other,
        }
    }

    pub fn style(self) -> Style {
        match self {
            ArterialClass::National => Style::new(MapColor::Black, 4),
            ArterialClass::State => Style::new(MapColor::Orange, 3),
            ArterialClass::MajorDistrict => Style::new(MapColor::Purple, 2),
            ArterialClass::Other => Style::new(MapColor::Gray, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArterialClass::National => "NH",
            ArterialClass::State => "SH",
            ArterialClass::MajorDistrict => "MDR",
            ArterialClass::Other => "Other",
        }
    }
}

pub fn arterial_style(road_number: Option<&str>) -> Style {
    ArterialClass::classify(road_number).style()
}
