pub mod camera;
pub mod channel;
pub mod collection;
pub mod color_info;
pub mod color_name;
pub mod coordinate_mapper;
pub mod copy_indicator;
pub mod notice;
pub mod pixel_reader;
pub mod storage;
pub mod surface;
pub mod theme;
