use clap::{Parser, Subcommand};


#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ONNX model path
    #[arg(long, env = "FOOD_DETECT_MODEL", default_value_t = String::from("./models/best.onnx"))]
    pub model: String,

    /// class mapping JSON path
    #[arg(long, env = "FOOD_DETECT_CLASS_MAPPING", default_value_t = String::from("./class_mapping.json"))]
    pub class_mapping: String,

    #[arg(long, env = "FOOD_DETECT_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    #[arg(long, env = "FOOD_DETECT_PORT", default_value_t = 8000)]
    pub port: u16,

    /// square model input size
    #[arg(long, env = "FOOD_DETECT_IMGSZ", default_value_t = 640)]
    pub imgsz: u32,

    /// NMS IoU threshold
    #[arg(long, env = "FOOD_DETECT_IOU", default_value_t = 0.7)]
    pub iou: f32,

    /// run on CUDA instead of CPU
    #[arg(long, env = "FOOD_DETECT_CUDA")]
    pub cuda: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Run detection on a local image and print the JSON response
    Detect {
        /// image path
        #[arg(long, required = true)]
        source: String,

        #[arg(long, default_value_t = 0.5)]
        conf: f32,

        /// write an annotated copy of the image here
        #[arg(long)]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_paths() {
        let args = Args::try_parse_from(["food-detect"]).unwrap();
        assert_eq!(args.model, "./models/best.onnx");
        assert_eq!(args.class_mapping, "./class_mapping.json");
        assert_eq!(args.port, 8000);
        assert!(args.command.is_none());
    }

    #[test]
    fn detect_subcommand_parses() {
        let args = Args::try_parse_from([
            "food-detect", "detect", "--source", "plate.jpg", "--conf", "0.25",
        ])
        .unwrap();
        match args.command {
            Some(Command::Detect { source, conf, output }) => {
                assert_eq!(source, "plate.jpg");
                assert_eq!(conf, 0.25);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
