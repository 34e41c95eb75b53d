use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The property names in exactly the order `properties::make_properties!` declares
/// `PropertyId`'s variants, so the generated map's values line up with the real enum.
const PROPERTIES: &[(&str, &str)] = &[
    ("color", "Color"),
    ("background-color", "BackgroundColor"),
    ("direction", "Direction"),
    ("font-style", "FontStyle"),
    ("font-weight", "FontWeight"),
    ("font-family", "FontFamily"),
    ("font-size", "FontSize"),
    ("font-variant-ligatures", "FontVariantLigatures"),
    ("font-variant-caps", "FontVariantCaps"),
    ("font-variant-numeric", "FontVariantNumeric"),
    ("font-variant-east-asian", "FontVariantEastAsian"),
    ("font-kerning", "FontKerning"),
    ("text-align", "TextAlign"),
    ("text-transform", "TextTransform"),
    ("visibility", "Visibility"),
    ("white-space", "WhiteSpace"),
    ("writing-mode", "WritingMode"),
    ("display", "Display"),
    ("position", "Position"),
    ("letter-spacing", "LetterSpacing"),
    ("word-spacing", "WordSpacing"),
    ("line-height", "LineHeight"),
    ("text-indent", "TextIndent"),
    ("widows", "Widows"),
    ("list-style-type", "ListStyleType"),
    ("width", "Width"),
    ("height", "Height"),
    ("margin-top", "MarginTop"),
    ("margin-right", "MarginRight"),
    ("margin-bottom", "MarginBottom"),
    ("margin-left", "MarginLeft"),
    ("padding-top", "PaddingTop"),
    ("padding-right", "PaddingRight"),
    ("padding-bottom", "PaddingBottom"),
    ("padding-left", "PaddingLeft"),
    ("z-index", "ZIndex"),
];

const LENGTH_UNITS: &[(&str, &str)] = &[
    ("px", "Px"),
    ("pt", "Pt"),
    ("pc", "Pc"),
    ("cm", "Cm"),
    ("mm", "Mm"),
    ("in", "In"),
    ("em", "Em"),
    ("ex", "Ex"),
    ("ch", "Ch"),
    ("rem", "Rem"),
    ("vw", "Vw"),
    ("vh", "Vh"),
    ("vmin", "Vmin"),
    ("vmax", "Vmax"),
];

const MARGIN_BOXES: &[(&str, &str)] = &[
    ("top-left-corner", "TopLeftCorner"),
    ("top-left", "TopLeft"),
    ("top-center", "TopCenter"),
    ("top-right", "TopRight"),
    ("top-right-corner", "TopRightCorner"),
    ("bottom-left-corner", "BottomLeftCorner"),
    ("bottom-left", "BottomLeft"),
    ("bottom-center", "BottomCenter"),
    ("bottom-right", "BottomRight"),
    ("bottom-right-corner", "BottomRightCorner"),
    ("left-top", "LeftTop"),
    ("left-middle", "LeftMiddle"),
    ("left-bottom", "LeftBottom"),
    ("right-top", "RightTop"),
    ("right-middle", "RightMiddle"),
    ("right-bottom", "RightBottom"),
];

fn write_map(out_dir: &Path, file_name: &str, static_name: &str, value_type: &str, entries: &[(&str, &str)]) {
    let path = out_dir.join(file_name);
    let mut file = BufWriter::new(File::create(&path).unwrap());

    let mut builder = phf_codegen::Map::new();
    for (key, variant) in entries {
        builder.entry(*key, &format!("{value_type}::{variant}"));
    }

    writeln!(
        file,
        "static {static_name}: phf::Map<&'static str, {value_type}> = {};",
        builder.build()
    )
    .unwrap();
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let out_dir = Path::new(&out_dir);

    write_map(out_dir, "property_ids.rs", "PROPERTY_IDS", "PropertyId", PROPERTIES);
    write_map(out_dir, "length_units.rs", "LENGTH_UNITS", "LengthUnit", LENGTH_UNITS);
    write_map(out_dir, "margin_boxes.rs", "MARGIN_BOXES", "MarginBoxType", MARGIN_BOXES);
}
