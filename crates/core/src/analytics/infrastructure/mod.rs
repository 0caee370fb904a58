pub mod remote_emotion_logger;
