//! 位置参数表
//!
//! 记录每个命令的哪些参数按裸 token 发出而非 --flag value 对。
//! 这张表是领域数据而非逻辑：构建时检测重复条目并告警，按后写覆盖，
//! 避免在多份来源不一致时静默取其一。

use std::collections::HashMap;

/// 命令名 -> 有序位置参数名的扁平映射
#[derive(Debug, Clone, Default)]
pub struct PositionalSpec {
    map: HashMap<String, Vec<String>>,
}

impl PositionalSpec {
    /// 从条目列表构建；重复命令告警并保留后写条目
    pub fn from_entries(entries: &[(&str, &[&str])]) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::with_capacity(entries.len());
        for (command, params) in entries {
            let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
            if map.contains_key(*command) {
                tracing::warn!(
                    command = %command,
                    "duplicate positional entry, keeping the later one"
                );
            }
            map.insert(command.to_string(), params);
        }
        Self { map }
    }

    /// 该命令声明的位置参数名（无则为空切片）
    pub fn positional_params(&self, command: &str) -> &[String] {
        self.map
            .get(command)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_positional(&self, command: &str, param: &str) -> bool {
        self.positional_params(command).iter().any(|p| p == param)
    }

    /// bcc 工具套件的内置位置参数表
    pub fn defaults() -> Self {
        Self::from_entries(&[
            ("biolatency-bpfcc", &["interval", "count"]),
            ("biotop-bpfcc", &["interval", "count"]),
            ("btrfsdist-bpfcc", &["interval", "count"]),
            ("btrfsslower-bpfcc", &["min_ms"]),
            ("cachestat-bpfcc", &["interval", "count"]),
            ("cachetop-bpfcc", &["interval"]),
            ("cobjnew-bpfcc", &["pid", "interval"]),
            ("cpudist-bpfcc", &["interval", "count"]),
            ("cpuunclaimed-bpfcc", &["interval", "count"]),
            ("dbslower-bpfcc", &["engine"]),
            ("dbstat-bpfcc", &["engine"]),
            ("dcstat-bpfcc", &["interval", "count"]),
            ("deadlock-bpfcc", &["pid"]),
            ("ext4dist-bpfcc", &["interval", "count"]),
            ("ext4slower-bpfcc", &["min_ms"]),
            ("fileslower-bpfcc", &["min_ms"]),
            ("filetop-bpfcc", &["interval", "count"]),
            ("funccount-bpfcc", &["pattern"]),
            ("funclatency-bpfcc", &["pattern"]),
            ("funcslower-bpfcc", &["function"]),
            ("hardirqs-bpfcc", &["interval", "outputs"]),
            ("inject-bpfcc", &["base_function", "spec"]),
            ("javacalls-bpfcc", &["pid", "interval"]),
            ("javaflow-bpfcc", &["pid"]),
            ("javagc-bpfcc", &["pid"]),
            ("javaobjnew-bpfcc", &["pid", "interval"]),
            ("javastat-bpfcc", &["interval", "count"]),
            ("javathreads-bpfcc", &["pid"]),
            ("llcstat-bpfcc", &["duration"]),
            ("memleak-bpfcc", &["interval", "count"]),
            ("nfsdist-bpfcc", &["interval", "count"]),
            ("nfsslower-bpfcc", &["min_ms"]),
            ("nodegc-bpfcc", &["pid"]),
            ("nodestat-bpfcc", &["interval", "count"]),
            ("offcputime-bpfcc", &["duration"]),
            ("offwaketime-bpfcc", &["duration"]),
            ("perlcalls-bpfcc", &["pid", "interval"]),
            ("perlflow-bpfcc", &["pid"]),
            ("perlstat-bpfcc", &["interval", "count"]),
            ("phpcalls-bpfcc", &["pid", "interval"]),
            ("phpflow-bpfcc", &["pid"]),
            ("phpstat-bpfcc", &["interval", "count"]),
            ("profile-bpfcc", &["duration"]),
            ("pythoncalls-bpfcc", &["pid", "interval"]),
            ("pythonflow-bpfcc", &["pid"]),
            ("pythongc-bpfcc", &["pid"]),
            ("pythonstat-bpfcc", &["interval", "count"]),
            ("rubycalls-bpfcc", &["pid", "interval"]),
            ("rubyflow-bpfcc", &["pid"]),
            ("rubygc-bpfcc", &["pid"]),
            ("rubyobjnew-bpfcc", &["pid", "interval"]),
            ("rubystat-bpfcc", &["interval", "count"]),
            ("runqlat-bpfcc", &["interval", "count"]),
            ("runqlen-bpfcc", &["interval", "count"]),
            ("runqslower-bpfcc", &["min_us"]),
            ("slabratetop-bpfcc", &["interval", "count"]),
            ("softirqs-bpfcc", &["interval", "count"]),
            ("stackcount-bpfcc", &["pattern"]),
            ("tclcalls-bpfcc", &["pid", "interval"]),
            ("tclflow-bpfcc", &["pid"]),
            ("tclobjnew-bpfcc", &["pid", "interval"]),
            ("tclstat-bpfcc", &["interval", "count"]),
            ("tcpconnlat-bpfcc", &["duration_ms"]),
            ("tcpsubnet-bpfcc", &["subnets"]),
            ("tcptop-bpfcc", &["interval", "count"]),
            ("tplist-bpfcc", &["filter"]),
            ("trace-bpfcc", &["probe"]),
            ("ttysnoop-bpfcc", &["device"]),
            ("ucalls", &["pid", "interval"]),
            ("uflow", &["pid"]),
            ("ugc", &["pid"]),
            ("uobjnew", &["pid", "interval"]),
            ("ustat", &["interval", "count"]),
            ("uthreads", &["pid"]),
            ("wakeuptime-bpfcc", &["duration"]),
            ("xfsdist-bpfcc", &["interval", "count"]),
            ("xfsslower-bpfcc", &["min_ms"]),
            ("zfsdist-bpfcc", &["interval", "count"]),
            ("zfsslower-bpfcc", &["min_ms"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_tools() {
        let spec = PositionalSpec::defaults();
        assert!(spec.is_positional("profile-bpfcc", "duration"));
        assert!(spec.is_positional("trace-bpfcc", "probe"));
        assert!(!spec.is_positional("profile-bpfcc", "frequency"));
        assert!(!spec.is_positional("bpftrace", "program"));
    }

    #[test]
    fn duplicate_entries_keep_the_later_one() {
        let spec = PositionalSpec::from_entries(&[
            ("tool", &["first"]),
            ("tool", &["second"]),
        ]);
        assert!(spec.is_positional("tool", "second"));
        assert!(!spec.is_positional("tool", "first"));
    }

    #[test]
    fn unknown_command_has_no_positionals() {
        let spec = PositionalSpec::defaults();
        assert!(spec.positional_params("unknown").is_empty());
    }
}
