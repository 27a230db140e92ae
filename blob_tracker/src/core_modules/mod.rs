pub mod blob;
pub mod blob_collection;
pub mod blob_engine;
pub mod blob_index;
pub mod classifier;
pub mod color_category;
pub mod color_space;
pub mod frame;
pub mod pixel;
pub mod renderer;
pub mod run;

#[cfg(test)]
pub(crate) mod test_utils;
