pub mod bitmap_font;
pub mod box_label_annotator;
