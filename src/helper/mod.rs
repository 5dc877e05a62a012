pub mod gesture_helper;
