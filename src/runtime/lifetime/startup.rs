use crate::cache::{
    ObjectCache,
    register::{get_object_cache_plugin, registered_object_cache_plugins},
};
use crate::config::AppConfig;
use crate::llm::{LlmClient, OllamaClient};
use crate::models::system::entities::SettingDefault;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::services::system::DynamicConfig;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub llm: Arc<dyn LlmClient>,
}

/// 按名称构造缓存后端
async fn try_cache_backend(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let Some(constructor) = get_object_cache_plugin(name) else {
        warn!(
            "Cache backend '{}' not found in registry (available: {})",
            name,
            registered_object_cache_plugins().join(", ")
        );
        return None;
    };
    match constructor().await {
        Ok(cache) => Some(Arc::from(cache)),
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时退回内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();

    if let Some(cache) = try_cache_backend(cache_type).await {
        info!("Using {} cache backend", cache_type);
        return Ok(cache);
    }

    if cache_type != "moka" {
        warn!("Falling back to in-memory moka cache");
        if let Some(cache) = try_cache_backend("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 生成管理员初始密码，保证同时包含字母和数字
fn generate_admin_password() -> String {
    use rand::Rng;
    const LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";

    let mut rng = rand::rng();
    let mut password: String = (0..12)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect();
    for _ in 0..4 {
        password.push(DIGITS[rng.random_range(0..DIGITS.len())] as char);
    }
    password
}

/// 初始化动态配置缓存
/// 先补齐缺失的配置项，再从数据库加载到全局缓存
async fn init_dynamic_config(storage: &Arc<dyn Storage>) {
    match storage
        .insert_missing_settings(&SettingDefault::all(AppConfig::get()))
        .await
    {
        Ok(0) => {}
        Ok(count) => info!("Inserted {} default setting(s)", count),
        Err(e) => warn!("Failed to insert default settings: {}", e),
    }

    match storage.list_all_settings().await {
        Ok(settings) => {
            DynamicConfig::init(settings.into_iter().map(|s| (s.key, s.value)).collect()).await
        }
        Err(e) => {
            // 空缓存下各项读取回退到默认值
            warn!("Failed to load settings: {}, using defaults", e);
            DynamicConfig::init(Vec::new()).await;
        }
    }
}

/// 库中没有任何账号时创建默认管理员
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(0) => info!("No users found, creating default admin account"),
        Ok(count) => {
            debug!("{} user(s) present, admin seed skipped", count);
            return;
        }
        Err(e) => {
            warn!("Failed to count users: {}, admin seed skipped", e);
            return;
        }
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            let generated = generate_admin_password();
            warn!(
                "ADMIN_PASSWORD is not set, generated admin password: {}",
                generated
            );
            generated
        }
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}", e);
            return;
        }
    };

    let request = CreateUserRequest {
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        password: password_hash,
        role: UserRole::Admin,
        display_name: Some("Administrator".to_string()),
        avatar_url: None,
        department_id: None,
    };

    match storage.create_user(request).await {
        Ok(user) => info!("Default admin created (id {})", user.id),
        Err(e) => warn!("Failed to create admin account: {}", e),
    }
}

/// 启动前的准备工作，失败即终止进程
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        debug!(
            "Registered cache backends: {}",
            registered_object_cache_plugins().join(", ")
        );
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    init_dynamic_config(&storage).await;
    seed_admin(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    // Ollama 客户端只在调用时连接，启动阶段不探测可用性
    let llm: Arc<dyn LlmClient> = Arc::new(
        OllamaClient::from_config(&AppConfig::get().llm).expect("Failed to create LLM client"),
    );
    warn!(
        "LLM client configured for {}",
        AppConfig::get().llm.base_url
    );

    StartupContext {
        storage,
        cache,
        llm,
    }
}
