//! 终端答题界面 - 编排层
//!
//! 最小的逐行交互：显示题目、读取选择、展示反馈。
//! 答对后等待固定时间自动进入下一题；答错需要按 Enter 才继续。

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::models::{AnswerFeedback, Question};
use crate::orchestrator::quiz_controller::QuizController;
use crate::services::{LlmService, QuestionSource};
use crate::utils::logging::log_startup;
use crate::workflow::{Phase, SessionSnapshot};

type InputLines = Lines<BufReader<Stdin>>;

/// 应用主结构
pub struct App {
    config: Config,
    controller: QuizController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let source: Arc<dyn QuestionSource> = Arc::new(LlmService::new(&config));
        let controller = QuizController::new(source);

        Ok(Self { config, controller })
    }

    /// 运行答题主循环，直到用户退出或输入结束
    pub async fn run(mut self) -> Result<()> {
        let loading = spawn_loading_indicator(self.controller.subscribe());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("\n=== English Grammar Quiz ===");
        println!("¡Pon a prueba tus conocimientos de inglés!\n");

        self.controller.start().await;

        loop {
            let snapshot = self.controller.snapshot();
            match snapshot.phase {
                Phase::Ready => {
                    let Some(question) = snapshot.current_question.clone() else {
                        self.controller.restart().await;
                        continue;
                    };

                    print_question(&snapshot, &question);
                    let Some(selected) = read_selection(&mut lines, &question).await? else {
                        break;
                    };

                    let feedback = question.check(&selected);
                    print_feedback(&feedback);

                    if feedback.is_correct {
                        tokio::time::sleep(self.config.correct_advance_delay()).await;
                    } else {
                        println!("\n[Enter] Siguiente Pregunta");
                        if lines.next_line().await?.is_none() {
                            break;
                        }
                    }

                    self.controller.submit_answer(&selected).await;
                }
                Phase::Failed => {
                    println!("\n¡Oops! Algo salió mal");
                    if let Some(err) = snapshot.last_error.as_deref() {
                        println!("{}", err);
                    }
                    println!("[r] Intentar de Nuevo   [q] Salir");

                    match lines.next_line().await? {
                        Some(line) if line.trim().eq_ignore_ascii_case("r") => {
                            self.controller.restart().await;
                        }
                        Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
                        Some(_) => continue,
                        None => break,
                    }
                }
                Phase::Initializing | Phase::AwaitingRecoveryFetch => {
                    self.controller.start().await;
                }
            }
        }

        loading.abort();

        let snapshot = self.controller.snapshot();
        let answered = snapshot.question_index.saturating_sub(1);
        println!("\nPuntaje final: {} / {}", snapshot.score, answered);
        info!("👋 退出，得分 {}/{}", snapshot.score, answered);

        Ok(())
    }
}

/// 在等待阶段打印加载提示
fn spawn_loading_indicator(mut rx: watch::Receiver<SessionSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut was_waiting = false;
        while rx.changed().await.is_ok() {
            let waiting = rx.borrow_and_update().phase.is_waiting();
            if waiting && !was_waiting {
                println!("⏳ Cargando pregunta...");
            }
            was_waiting = waiting;
        }
    })
}

fn print_question(snapshot: &SessionSnapshot, question: &Question) {
    println!("\n{}", "─".repeat(40));
    println!("Pregunta {}   Puntaje: {}", snapshot.question_index, snapshot.score);
    println!("Completa la oración:");
    println!("  {}\n", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
}

fn print_feedback(feedback: &AnswerFeedback) {
    if feedback.is_correct {
        println!("\n✅ ¡Correcto!");
    } else {
        println!("\n❌ ¡Incorrecto!");
        println!("Respuesta correcta: {}", feedback.correct_answer);
        println!("{}", feedback.explanation);
    }
}

/// 读取用户选择（编号或选项原文），`q` 或输入结束返回 `None`
async fn read_selection(lines: &mut InputLines, question: &Question) -> Result<Option<String>> {
    let options = question.options();
    loop {
        println!("\nElija una opción (1-{}) o 'q' para salir:", options.len());

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };

        match parse_selection(line.trim(), options) {
            Selection::Quit => return Ok(None),
            Selection::Option(selected) => return Ok(Some(selected)),
            Selection::Invalid => println!("Opción no válida."),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Selection {
    Option(String),
    Quit,
    Invalid,
}

fn parse_selection(input: &str, options: &[String]) -> Selection {
    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }

    if let Ok(n) = input.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| options.get(i)) {
            Some(option) => Selection::Option(option.clone()),
            None => Selection::Invalid,
        };
    }

    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(input))
        .map(|o| Selection::Option(o.clone()))
        .unwrap_or(Selection::Invalid)
}
