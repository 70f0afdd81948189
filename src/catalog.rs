//! Builtin configuration types.
//!
//! Each type is a thin declaration: the keys it owns and how each is
//! validated. Series types are composed from shared components with
//! [`Schema::merge`]; later components win, in the order
//! `series_base`, `line_component`, then the type's own entries.

use crate::ast::ElementKind;
use crate::schema::{Registry, RegistryBuilder, Schema, SchemaEntry};
use crate::validators::Validator;
use once_cell::sync::Lazy;

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    schemas()
        .build()
        .expect("builtin schemas reference only builtin types")
});

/// The process-wide registry of builtin types.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

/// A builder preloaded with the builtin types, for hosts that register
/// their own types next to them.
pub fn schemas() -> RegistryBuilder {
    Registry::builder()
        .register(gradient())
        .register(pattern())
        .register(pattern_options())
        .register(chart_events())
        .register(chart_options())
        .register(title_options())
        .register(credits_options())
        .register(exporting_options())
        .register(marker_options())
        .register(tooltip_options())
        .register(time_options())
        .register(data_point())
        .register(line_series())
        .register(area_series())
        .register(box_plot_data())
        .register(box_plot_series())
        .register(options())
}

/// A CSS color, a gradient or a pattern fill.
pub fn color() -> Validator {
    Validator::one_of([
        Validator::Color,
        Validator::object("Gradient"),
        Validator::object("Pattern"),
    ])
}

fn style() -> Validator {
    Validator::Attributes(ElementKind::Scalar)
}

fn size() -> Validator {
    Validator::one_of([Validator::number(), Validator::String])
}

fn gradient() -> Schema {
    Schema::new("Gradient")
        .entry(SchemaEntry::new("linear_gradient", Validator::Attributes(ElementKind::Number)))
        .entry(SchemaEntry::new("radial_gradient", Validator::Attributes(ElementKind::Number)))
        .entry(SchemaEntry::new("stops", Validator::array_of(Validator::Any)))
}

fn pattern() -> Schema {
    Schema::new("Pattern")
        .entry(SchemaEntry::new("pattern_options", Validator::object("PatternOptions")))
        .entry(SchemaEntry::new("pattern_index", Validator::integer(Some(0.0), None)))
}

fn pattern_options() -> Schema {
    Schema::new("PatternOptions")
        .entry(SchemaEntry::new("id", Validator::String))
        .entry(SchemaEntry::new("path", Validator::one_of([Validator::String, style()])))
        .entry(SchemaEntry::new("image", Validator::String))
        .entry(SchemaEntry::new("color", Validator::Color))
        .entry(SchemaEntry::new("background_color", Validator::Color))
        .entry(SchemaEntry::new("opacity", Validator::number_range(0.0, 1.0)))
        .entry(SchemaEntry::new("width", Validator::non_negative()))
        .entry(SchemaEntry::new("height", Validator::non_negative()))
        .entry(SchemaEntry::new("x", Validator::number()))
        .entry(SchemaEntry::new("y", Validator::number()))
        .entry(SchemaEntry::new("pattern_transform", Validator::String))
}

fn chart_events() -> Schema {
    ["add_series", "click", "load", "redraw", "render", "selection"]
        .into_iter()
        .fold(Schema::new("ChartEvents"), |schema, event| {
            schema.entry(SchemaEntry::new(event, Validator::Callable))
        })
}

fn chart_options() -> Schema {
    let sides = |prefix: &str| -> Vec<SchemaEntry> {
        ["top", "right", "bottom", "left"]
            .iter()
            .map(|side| SchemaEntry::new(&format!("{prefix}_{side}"), Validator::number()))
            .collect()
    };

    let mut schema = Schema::new("ChartOptions")
        .entry(SchemaEntry::new(
            "animation",
            Validator::one_of([Validator::Boolean, style()]),
        ))
        .entry(SchemaEntry::new("background_color", color()))
        .entry(SchemaEntry::new("border_color", color()))
        .entry(SchemaEntry::new("border_radius", Validator::non_negative()))
        .entry(SchemaEntry::new("border_width", Validator::non_negative()))
        .entry(SchemaEntry::new("class_name", Validator::String))
        .entry(SchemaEntry::new("events", Validator::object("ChartEvents")))
        .entry(SchemaEntry::new("height", size()))
        .entry(SchemaEntry::fan_out(
            "margin",
            &["margin_top", "margin_right", "margin_bottom", "margin_left"],
        ));
    for entry in sides("margin") {
        schema = schema.entry(entry);
    }
    schema = schema
        .entry(SchemaEntry::new("plot_background_color", color()))
        .entry(SchemaEntry::new("reflow", Validator::Boolean))
        .entry(SchemaEntry::fan_out(
            "spacing",
            &["spacing_top", "spacing_right", "spacing_bottom", "spacing_left"],
        ));
    for entry in sides("spacing") {
        schema = schema.entry(entry);
    }
    schema
        .entry(SchemaEntry::new("style", style()))
        .entry(SchemaEntry::new("styled_mode", Validator::Boolean))
        .entry(SchemaEntry::new("type_", Validator::String))
        .entry(SchemaEntry::new("width", size()))
        .entry(SchemaEntry::new("zoom_type", Validator::enumeration(&["x", "y", "xy"])))
}

fn title_options() -> Schema {
    Schema::new("TitleOptions")
        .entry(SchemaEntry::new("align", Validator::enumeration(&["left", "center", "right"])))
        .entry(SchemaEntry::new("floating", Validator::Boolean))
        .entry(SchemaEntry::new("margin", Validator::number()))
        .entry(SchemaEntry::new("style", style()))
        .entry(SchemaEntry::new("text", Validator::String))
        .entry(SchemaEntry::new("use_html", Validator::Boolean))
        .entry(SchemaEntry::new(
            "vertical_align",
            Validator::enumeration(&["top", "middle", "bottom"]),
        ))
        .entry(SchemaEntry::new("x", Validator::number()))
        .entry(SchemaEntry::new("y", Validator::number()))
}

fn credits_options() -> Schema {
    Schema::new("CreditsOptions")
        .entry(SchemaEntry::new("enabled", Validator::Boolean))
        .entry(SchemaEntry::new("href", Validator::String))
        .entry(SchemaEntry::new("style", style()))
        .entry(SchemaEntry::new("text", Validator::String))
}

fn exporting_options() -> Schema {
    Schema::new("ExportingOptions")
        .entry(SchemaEntry::new("allow_html", Validator::Boolean))
        .entry(SchemaEntry::new("enabled", Validator::Boolean))
        .entry(SchemaEntry::new("fallback_to_export_server", Validator::Boolean))
        .entry(SchemaEntry::new("filename", Validator::String))
        .entry(SchemaEntry::new("lib_url", Validator::String).with_key("libURL"))
        .entry(SchemaEntry::new("scale", Validator::non_negative()))
        .entry(SchemaEntry::new("source_height", Validator::non_negative()))
        .entry(SchemaEntry::new("source_width", Validator::non_negative()))
        .entry(SchemaEntry::new(
            "type_",
            Validator::enumeration(&["image/png", "image/jpeg", "application/pdf", "image/svg+xml"]),
        ))
        .entry(SchemaEntry::new("url", Validator::String))
}

fn marker_options() -> Schema {
    Schema::new("MarkerOptions")
        .entry(SchemaEntry::new("enabled", Validator::Boolean))
        .entry(SchemaEntry::new("fill_color", color()))
        .entry(SchemaEntry::new("line_color", color()))
        .entry(SchemaEntry::new("line_width", Validator::non_negative()))
        .entry(SchemaEntry::new("radius", Validator::non_negative()))
        .entry(SchemaEntry::new("symbol", Validator::String))
        .entry(SchemaEntry::new("states", Validator::Any))
}

fn tooltip_options() -> Schema {
    Schema::new("TooltipOptions")
        .entry(SchemaEntry::new("background_color", color()))
        .entry(SchemaEntry::new("border_width", Validator::non_negative()))
        .entry(SchemaEntry::new("enabled", Validator::Boolean))
        .entry(SchemaEntry::new("formatter", Validator::Callable))
        .entry(SchemaEntry::new("header_format", Validator::String))
        .entry(SchemaEntry::new("point_format", Validator::String))
        .entry(SchemaEntry::new("point_formatter", Validator::Callable))
        .entry(SchemaEntry::new("shared", Validator::Boolean))
        .entry(SchemaEntry::new("use_html", Validator::Boolean))
        .entry(SchemaEntry::new("value_decimals", Validator::integer(Some(0.0), None)))
        .entry(SchemaEntry::new("value_prefix", Validator::String))
        .entry(SchemaEntry::new("value_suffix", Validator::String))
}

fn time_options() -> Schema {
    Schema::new("TimeOptions")
        .entry(SchemaEntry::new("timezone", Validator::String))
        .entry(SchemaEntry::new("timezone_offset", Validator::number()))
        .entry(SchemaEntry::new("use_utc", Validator::Boolean))
}

fn data_point() -> Schema {
    Schema::new("DataPoint")
        .entry(SchemaEntry::new("x", Validator::number()))
        .entry(SchemaEntry::new("y", Validator::number()))
        .entry(SchemaEntry::new("name", Validator::String))
        .entry(SchemaEntry::new("color", color()))
        .entry(SchemaEntry::new("id", Validator::String))
        .entry(SchemaEntry::new("custom", style()))
        .entry(SchemaEntry::new("marker", Validator::object("MarkerOptions")))
        .array_form(&["y"])
        .array_form(&["x", "y"])
}

/// Entries shared by every series type.
fn series_base() -> Schema {
    Schema::new("SeriesBase")
        .entry(SchemaEntry::new("id", Validator::String))
        .entry(SchemaEntry::new("name", Validator::String))
        .entry(SchemaEntry::new("index", Validator::integer(Some(0.0), None)))
        .entry(SchemaEntry::new("visible", Validator::Boolean))
        .entry(SchemaEntry::new("color", color()))
        .entry(SchemaEntry::new("class_name", Validator::String))
        .entry(SchemaEntry::new("custom", style()))
        .entry(SchemaEntry::new("marker", Validator::object("MarkerOptions")))
        .entry(SchemaEntry::new("point_interval", Validator::number()))
        .entry(SchemaEntry::new("point_start", Validator::number()))
        .entry(SchemaEntry::new("tooltip", Validator::object("TooltipOptions")))
        .entry(SchemaEntry::new("z_index", Validator::number()))
}

fn line_component() -> Schema {
    Schema::new("LineComponent")
        .entry(SchemaEntry::new(
            "data",
            Validator::array_of(Validator::one_of([
                Validator::number(),
                Validator::object("DataPoint"),
            ])),
        ))
        .entry(SchemaEntry::new("dash_style", Validator::String))
        .entry(SchemaEntry::new("line_width", Validator::non_negative()))
        .entry(SchemaEntry::new("step", Validator::enumeration(&["left", "center", "right"])))
}

fn line_series() -> Schema {
    Schema::new("LineSeries")
        .merge(&series_base())
        .merge(&line_component())
        .tagged()
}

fn area_series() -> Schema {
    Schema::new("AreaSeries")
        .merge(&series_base())
        .merge(&line_component())
        .entry(SchemaEntry::new("fill_color", color()))
        .entry(SchemaEntry::new("fill_opacity", Validator::number_range(0.0, 1.0)))
        .entry(SchemaEntry::new("negative_fill_color", color()))
        .entry(SchemaEntry::new("threshold", Validator::number()))
        .tagged()
}

fn box_plot_data() -> Schema {
    ["x", "low", "q1", "median", "q3", "high"]
        .into_iter()
        .fold(Schema::new("BoxPlotData"), |schema, name| {
            schema.entry(SchemaEntry::new(name, Validator::number()))
        })
        .entry(SchemaEntry::new("name", Validator::String))
        .entry(SchemaEntry::new("color", color()))
        .array_form(&["low", "q1", "median", "q3", "high"])
        .array_form(&["x", "low", "q1", "median", "q3", "high"])
}

fn box_plot_series() -> Schema {
    Schema::new("BoxPlotSeries")
        .merge(&series_base())
        .entry(SchemaEntry::new(
            "data",
            Validator::array_of(Validator::object("BoxPlotData")),
        ))
        .entry(SchemaEntry::new("fill_color", color()))
        .entry(SchemaEntry::new("median_color", color()))
        .entry(SchemaEntry::new("whisker_length", size()))
        .tagged()
}

fn options() -> Schema {
    Schema::new("Options")
        .entry(SchemaEntry::new("chart", Validator::object("ChartOptions")))
        .entry(SchemaEntry::new(
            "colors",
            Validator::array_of(color()),
        ))
        .entry(SchemaEntry::new(
            "credits",
            Validator::one_of([Validator::Boolean, Validator::object("CreditsOptions")]),
        ))
        .entry(SchemaEntry::new("defs", Validator::Nodes))
        .entry(SchemaEntry::new("exporting", Validator::object("ExportingOptions")))
        .entry(SchemaEntry::new(
            "series",
            Validator::array_of(Validator::tagged_union(&[
                "LineSeries",
                "AreaSeries",
                "BoxPlotSeries",
            ])),
        ))
        .entry(SchemaEntry::new("subtitle", Validator::object("TitleOptions")))
        .entry(SchemaEntry::new("time", Validator::object("TimeOptions")))
        .entry(SchemaEntry::new("title", Validator::object("TitleOptions")))
        .entry(SchemaEntry::new("tooltip", Validator::object("TooltipOptions")))
}
