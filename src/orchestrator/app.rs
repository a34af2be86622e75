//! 应用会话 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责把各层组装成一次完整的终端会话。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：构建 HTTP 后端、身份门卫、工作流控制器
//! 2. **身份解析**：启动时解析一次登录状态，未登录则给出登录入口
//! 3. **会话驱动**：读取仓库地址、逐题收集答案、提交并等待评分
//! 4. **结果渲染**：评分到齐后输出成绩汇总与逐题评语
//!
//! ## 设计特点
//!
//! - **顶层编排**：不做任何阶段迁移判断，全部委托 WorkflowController
//! - **资源所有者**：唯一持有后端句柄的模块
//! - **向下委托**：App → workflow → services → api

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{HttpBackend, QuestionBackend};
use crate::config::Config;
use crate::models::{GradeReport, Question};
use crate::services::{AuthState, IdentityGate};
use crate::utils::logging::{log_shutdown, log_startup, truncate_text};
use crate::workflow::{GradeState, WorkflowController};

/// 应用主结构
pub struct App {
    backend: Arc<dyn QuestionBackend>,
    gate: IdentityGate,
    controller: WorkflowController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let backend: Arc<dyn QuestionBackend> = Arc::new(HttpBackend::new(&config)?);
        let gate = IdentityGate::new(backend.clone());
        let controller = WorkflowController::new(backend.clone(), &config);

        Ok(Self {
            backend,
            gate,
            controller,
        })
    }

    /// 运行会话主循环
    pub async fn run(&mut self) -> Result<()> {
        // 启动时解析一次登录身份
        if let AuthState::Unauthenticated = self.gate.resolve().await {
            info!("未登录。请先在浏览器中完成 GitHub 登录:");
            info!("🔗 {}", self.backend.auth_url());
            return Ok(());
        }

        if self.gate.is_instructor() {
            info!("🎓 讲师工具 - CSV 导出: {}", self.backend.csv_export_url());
        }

        'session: loop {
            let Some(line) = read_line("\nGitHub 仓库地址 (:quit 退出, :logout 登出): ") else {
                break;
            };
            match line.as_str() {
                "" => continue,
                ":quit" => break,
                ":logout" => {
                    self.gate.logout().await;
                    self.controller.reset();
                    info!("👋 已登出");
                    break;
                }
                repo_url => {
                    if let Err(e) = self.controller.start_submission(repo_url).await {
                        warn!("❌ {}", e);
                        continue;
                    }
                }
            }

            self.collect_answers(None);

            // 提交答案；未作答的题目补答后重试
            let job = loop {
                match self.controller.submit_answers().await {
                    Ok(job) => break job,
                    Err(e) => {
                        if let Some(ids) = e.incomplete_answers() {
                            let ids: Vec<String> = ids.to_vec();
                            warn!("⚠️ 请先回答所有题目 ({} 道未作答)", ids.len());
                            self.collect_answers(Some(&ids));
                            continue;
                        }
                        warn!("❌ {}", e);
                        match read_line("重试提交? (y/n): ").as_deref() {
                            Some("y") | Some("Y") => continue,
                            _ => {
                                self.controller.reset();
                                continue 'session;
                            }
                        }
                    }
                }
            };

            // 同步等待评分轮询收束，再把产出交回控制器
            let outcome = job.run().await;
            self.controller.apply_poll_outcome(outcome);
            self.render_grades();

            match read_line("\n再提交一个仓库? (y/n): ").as_deref() {
                Some("y") | Some("Y") => self.controller.reset(),
                _ => break,
            }
        }

        log_shutdown();
        Ok(())
    }

    /// 逐题收集答案
    ///
    /// `only` 给出时只重新收集这些题目（补答场景）。
    fn collect_answers(&mut self, only: Option<&[String]>) {
        let Some(submission) = self.controller.submission() else {
            return;
        };
        let questions: Vec<Question> = submission
            .questions
            .iter()
            .filter(|q| only.map(|ids| ids.contains(&q.id)).unwrap_or(true))
            .cloned()
            .collect();
        let total = self.controller.submission().map(|s| s.questions.len()).unwrap_or(0);

        for question in questions {
            println!("\n┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄");
            println!("📍 {} (共 {} 题)", question.location(), total);
            println!("❓ {}", question.text);
            println!("{}", question.excerpt.trim_end());

            // 作答计时覆盖用户在提示符上停留的时间
            self.controller.question_focused(&question.id);
            let answer = read_line("你的回答: ").unwrap_or_default();
            self.controller.question_blurred(&question.id);

            if !answer.is_empty() {
                self.controller.edit_answer(&question.id, answer);
            }
        }
    }

    /// 渲染评分结果
    fn render_grades(&self) {
        match self.controller.grade_state() {
            GradeState::Ready(grades) => {
                let Some(report) = GradeReport::from_grades(grades) else {
                    return;
                };
                info!("\n{}", "=".repeat(60));
                info!(
                    "📊 成绩: {}% ({}) - {}/{} 分",
                    report.percent,
                    report.level.label(),
                    report.total_score,
                    report.max_score
                );
                info!("平均批改置信度: {}%", report.average_confidence_percent);
                info!("{}", "=".repeat(60));

                if let Some(submission) = self.controller.submission() {
                    for (index, question) in submission.questions.iter().enumerate() {
                        let Some(grade) = grades.get(index) else {
                            continue;
                        };
                        info!(
                            "Q{} [{}/5] {}",
                            index + 1,
                            grade.score,
                            truncate_text(&question.text, 40)
                        );
                        info!("   评语: {}", grade.rationale);
                    }
                }
            }
            GradeState::StillGrading => {
                info!("⏳ 批改仍在进行中，稍后可在服务端查看结果");
            }
            _ => {}
        }
    }
}

/// 读取一行用户输入（去掉首尾空白）；EOF 返回 None
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = std::io::stdout().flush();

    let mut buffer = String::new();
    match std::io::stdin().read_line(&mut buffer) {
        Ok(0) => None,
        Ok(_) => Some(buffer.trim().to_string()),
        Err(_) => None,
    }
}
