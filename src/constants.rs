/// Environment variables the harness requires
pub mod env {
    /// Name of the SMB share under test
    pub const SHARE_NAME: &str = "SHARE_NAME";

    /// First user allowed to mount the share
    pub const SHARE_USERNAME: &str = "SHARE_USERNAME";

    /// Second user, used by the multi-credential scenario
    pub const SHARE_USERNAME2: &str = "SHARE_USERNAME2";

    /// Password shared by both users
    pub const SHARE_PASSWORD: &str = "SHARE_PASSWORD";

    /// Fully qualified domain name of the share host
    pub const SHARE_FQDN: &str = "SHARE_FQDN";

    /// IP address of the share host
    pub const SHARE_IP: &str = "SHARE_IP";

    /// Image tag under test (1709, 1803, 2019)
    pub const VERSION_TAG: &str = "VERSION_TAG";

    /// Directory whose contents are copied into the image build context
    pub const DEPENDENCIES_DIR: &str = "DEPENDENCIES_DIR";

    /// All required variables, in the order they are reported when missing
    pub const REQUIRED: [&str; 8] = [
        SHARE_NAME,
        SHARE_USERNAME,
        SHARE_USERNAME2,
        SHARE_PASSWORD,
        SHARE_FQDN,
        SHARE_IP,
        VERSION_TAG,
        DEPENDENCIES_DIR,
    ];
}

/// Variables passed into the mount container
pub mod container_env {
    pub const SHARE_UNC: &str = "SHARE_UNC";
    pub const SHARE_USERNAME: &str = "SHARE_USERNAME";
    pub const SHARE_PASSWORD: &str = "SHARE_PASSWORD";
}

/// Image naming
pub mod image {
    /// Repository of the locally built image; the tag is the OS version
    pub const REPOSITORY: &str = "windows2016fs-ci";

    /// Dockerfile name expected under `<images_dir>/<tag>/`
    pub const DOCKERFILE: &str = "Dockerfile";
}

/// Default timeouts, in seconds
pub mod timeout {
    /// `docker build` of the image under test
    pub const BUILD_SECS: u64 = 10 * 60;

    /// One SMB mount container
    pub const MOUNT_SECS: u64 = 5 * 60;

    /// Short query containers (services, .NET, registry, DLLs)
    pub const QUERY_SECS: u64 = 30;
}

/// Number of parallel mounts in the concurrent-access scenario
pub const DEFAULT_CONCURRENT_MOUNTS: usize = 10;

/// Default location of the per-tag fixture directories
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";

/// Default directory holding `<tag>/Dockerfile`
pub const DEFAULT_IMAGES_DIR: &str = ".";
