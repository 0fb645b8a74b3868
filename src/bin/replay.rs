use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing_subscriber::EnvFilter;

use kagami_motion::config::Config;
use kagami_motion::pose::Pose;
use kagami_motion::task::{Baseline, Task};

const CONFIG_PATH: &str = "config.toml";
/// タイムスタンプなしのフレーム列に仮定するフレーム間隔（秒）
const DEFAULT_DT: f32 = 1.0 / 30.0;

const TASK_NAMES: [&str; 6] = ["raise_hand", "one_leg", "gait", "jump", "tiptoe", "squat"];

/// 記録済みフレーム1行分。timeは省略可（省略時は30fps相当で進める）
#[derive(Deserialize)]
struct Frame {
    #[serde(default)]
    time: Option<f32>,
    pose: Pose,
}

fn usage() -> ! {
    eprintln!("使い方: replay <課題名> <フレームファイル(.jsonl)>");
    eprintln!("課題名: {}", TASK_NAMES.join(" / "));
    std::process::exit(1);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        usage();
    }
    let task_name = &args[1];
    let frame_path = &args[2];
    if !TASK_NAMES.contains(&task_name.as_str()) {
        eprintln!("不明な課題名: {}", task_name);
        usage();
    }

    let config = Config::load_or_default(CONFIG_PATH);

    println!("=== Kagami Motion Replay ({}) ===", env!("GIT_VERSION"));
    println!("課題: {}", task_name);
    println!("入力: {}", frame_path);
    println!();

    let file = File::open(frame_path)
        .with_context(|| format!("フレームファイルを開けません: {}", frame_path))?;
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: Frame = serde_json::from_str(&line)
            .with_context(|| format!("{}行目のフレームを読めません", i + 1))?;
        frames.push(frame);
    }
    if frames.is_empty() {
        bail!("フレームがありません");
    }
    let mean_visibility = frames
        .iter()
        .map(|f| f.pose.average_visibility())
        .sum::<f32>()
        / frames.len() as f32;
    println!(
        "{}フレーム読み込みました（平均可視度 {:.2}）",
        frames.len(),
        mean_visibility
    );
    if mean_visibility < config.measure.visibility {
        println!("警告: 可視度が低く、多くのフレームが無視される可能性があります");
    }

    // 基準値は先頭フレーム（立位を想定）から取る
    let baseline = Baseline::capture(&frames[0].pose, config.measure.visibility);
    let Some(mut task) = Task::by_name(task_name, &config, baseline) else {
        // 課題名は検証済みなので、残る失敗要因は基準値だけ
        bail!("先頭フレームから立位基準を取得できません（足首が見えていますか）");
    };

    let mut prev_time = frames[0].time;
    let mut last_message = String::new();
    let mut last = None;
    for frame in &frames {
        let dt = match (prev_time, frame.time) {
            (Some(p), Some(t)) if t > p => t - p,
            _ => DEFAULT_DT,
        };
        prev_time = frame.time;

        let update = task.update(&frame.pose, dt);
        if update.message != last_message {
            println!(
                "[{:>3.0}%] {:?}: {}",
                update.progress * 100.0,
                update.level,
                update.message
            );
            last_message = update.message.clone();
        }
        let done = update.done;
        last = Some(update);
        if done {
            break;
        }
    }

    let last = last.context("判定結果がありません")?;
    println!();
    if last.done {
        println!("課題完了！");
    } else {
        println!("フレーム列の終端に達しました（未完了）");
    }
    println!("メトリクス:");
    println!("{}", serde_json::to_string_pretty(&last.metrics)?);

    Ok(())
}
