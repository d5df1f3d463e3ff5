pub mod cascade_locator;
pub mod haar_cascade;
mod integral_image;
pub mod rectangle_grouping;
