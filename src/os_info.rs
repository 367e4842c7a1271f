use crate::command::OsQuery;
use crate::error::{Error, Result};
use std::env;
use std::fmt::Write;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

const CPUINFO: &str = "/proc/cpuinfo";

pub(crate) async fn os_info(query: OsQuery) -> Result<String> {
    match query {
        OsQuery::Eol => Ok(format!("EOL: {LINE_ENDING:?}")),
        OsQuery::Cpus => Ok(cpus().await),
        OsQuery::HomeDir => dirs::home_dir()
            .map(|home| format!("Home directory: {}", home.display()))
            .ok_or(Error::Unavailable("home directory")),
        OsQuery::Username => system_username()
            .map(|name| format!("System user name: {name}"))
            .ok_or(Error::Unavailable("system user name")),
        OsQuery::Architecture => Ok(format!("CPU architecture: {}", env::consts::ARCH)),
    }
}

#[derive(Debug, PartialEq)]
struct CpuInfo {
    model: String,
    mhz: Option<f64>,
}

async fn cpus() -> String {
    let details = if cfg!(target_os = "linux") {
        tokio::fs::read_to_string(CPUINFO)
            .await
            .map(|text| parse_cpuinfo(&text))
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let count = if details.is_empty() {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    } else {
        details.len()
    };
    format_cpus(count, &details)
}

fn format_cpus(count: usize, details: &[CpuInfo]) -> String {
    let mut out = format!("Overall amount of CPUs: {count}");
    for (index, cpu) in details.iter().enumerate() {
        let _ = write!(out, "\nCPU {}: {}", index + 1, cpu.model);
        if let Some(mhz) = cpu.mhz {
            let _ = write!(out, ", {:.2} GHz", mhz / 1000.0);
        }
    }
    out
}

/// One entry per `processor` block of a Linux `/proc/cpuinfo`.
fn parse_cpuinfo(text: &str) -> Vec<CpuInfo> {
    let mut cpus = Vec::new();
    for block in text.split("\n\n") {
        let mut is_processor = false;
        let mut model = None;
        let mut mhz = None;
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "processor" => is_processor = true,
                "model name" => model = Some(value.trim().to_string()),
                "cpu MHz" => mhz = value.trim().parse::<f64>().ok(),
                _ => {}
            }
        }
        if is_processor {
            cpus.push(CpuInfo {
                model: model.unwrap_or_else(|| "unknown model".to_string()),
                mhz,
            });
        }
    }
    cpus
}

fn system_username() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz\ncpu MHz\t\t: 1992.000\n\nprocessor\t: 1\nmodel name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz\ncpu MHz\t\t: 2100.5\n\n";

    #[test]
    fn test_parse_cpuinfo_blocks() {
        let cpus = parse_cpuinfo(SAMPLE);
        assert_eq!(cpus.len(), 2);
        assert_eq!(cpus[0].model, "Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz");
        assert_eq!(cpus[1].mhz, Some(2100.5));
    }

    #[test]
    fn test_parse_cpuinfo_without_model() {
        let cpus = parse_cpuinfo("processor\t: 0\nBogoMIPS\t: 48.00\n\nHardware\t: foo\n");
        assert_eq!(
            cpus,
            vec![CpuInfo {
                model: "unknown model".to_string(),
                mhz: None,
            }]
        );
    }

    #[test]
    fn test_format_cpus() {
        let out = format_cpus(2, &parse_cpuinfo(SAMPLE));
        assert_eq!(
            out,
            "Overall amount of CPUs: 2\n\
             CPU 1: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz, 1.99 GHz\n\
             CPU 2: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz, 2.10 GHz"
        );
        assert_eq!(format_cpus(4, &[]), "Overall amount of CPUs: 4");
    }

    #[tokio::test]
    async fn test_simple_queries() {
        let eol = os_info(OsQuery::Eol).await.unwrap();
        assert!(eol.starts_with("EOL: \""));
        assert!(eol.contains("\\n"));

        let arch = os_info(OsQuery::Architecture).await.unwrap();
        assert!(arch.ends_with(env::consts::ARCH));

        let cpus = os_info(OsQuery::Cpus).await.unwrap();
        assert!(cpus.starts_with("Overall amount of CPUs: "));
    }
}
