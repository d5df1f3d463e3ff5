pub mod sqlite_emotion_store;
