use crate::config::Settings;

pub struct DefaultConfig;

impl DefaultConfig {
    /// Commented config written by `outliner init`.
    pub fn create_default_config_file() -> String {
        r#"[model]
# Any OpenAI-compatible chat completion endpoint
base_url = "https://dashscope.aliyuncs.com/compatible-mode/v1"
model = "qwen-plus"
# Name of the environment variable holding the API key
api_key_env = "OPENAI_API_KEY"
temperature = 0.7
max_tokens = 1000
timeout_secs = 60

[parser]
# "trailing-section" or "per-section"
fallback_policy = "trailing-section"
fallback_title = "Analysis Result"

[history]
enabled = true
database_path = "~/.outliner/history.db"

[output]
use_colors = true

[server]
bind_addr = "127.0.0.1:3000"
"#
        .to_string()
    }

    pub fn get_default_settings() -> Settings {
        Settings::default()
    }
}
