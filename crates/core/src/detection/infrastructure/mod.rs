pub mod interruptible_oracle;
pub mod onnx_yolo_detector;
pub mod shared_oracle;
