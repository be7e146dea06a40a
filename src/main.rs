// main.rs: 窗口、事件循环、菜单与状态栏

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod assets;
mod config;
mod easing;
mod input;
mod layout;
mod picking;
mod renderer;
mod scene;
mod transition;

use assets::{start_load_room, LoadedImage, RoomAssetPaths, RoomGather};
use config::RoomConfig;
use input::{InputController, Viewport};
use layout::WallSpec;
use renderer::Renderer;
use scene::{build_scene, RoomScene};
use transition::{Phase, TickOutcome, ViewTransitionController};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

/// Browser-style wheel units per scroll line.
const WHEEL_LINE_UNITS: f32 = 100.0;

#[derive(Default)]
struct UiState {
    show_fps: bool,
    is_fullscreen: bool,
    is_loading: bool,
    fps: f32,
    transition_progress: f32,

    // 本帧 UI 发出的请求
    open_folder: Option<PathBuf>,
    reset_view: bool,
    toggle_fullscreen: bool,
    exit: bool,
}

/// Tracks which folder-open request is current and feeds arrivals into the gather.
struct RoomLoader {
    generation: u64,
    gather: RoomGather,
    tx: Sender<LoadedImage>,
    rx: Receiver<LoadedImage>,
}

impl RoomLoader {
    fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            generation: 0,
            gather: RoomGather::new(0),
            tx,
            rx,
        }
    }

    fn open(&mut self, dir: &Path) {
        self.generation += 1;
        self.gather.restart(self.generation);
        log::info!("opening room folder {}", dir.display());
        start_load_room(&RoomAssetPaths::from_dir(dir), self.generation, self.tx.clone());
    }

    fn poll(&mut self) -> Option<assets::RoomAssets> {
        let mut complete = None;
        while let Ok(img) = self.rx.try_recv() {
            match self.gather.accept(img) {
                Some(room) => complete = Some(room),
                None => log::debug!("{} room images outstanding", self.gather.pending()),
            }
        }
        complete
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RoomConfig::load_or_default(&config::resolve_config_path());
    let assets_dir = config::resolve_assets_dir();

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title("Room Viewer")
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("failed to create window: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone(), &config.camera)) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let mut view = ViewTransitionController::new(&config.camera, &config.transition, renderer.aspect());
    let mut input = InputController::new(config.input.clone());
    let mut scene: Option<RoomScene> = None;
    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);

    let clock = Instant::now();
    let now_ms = move || clock.elapsed().as_secs_f64() * 1000.0;

    let mut loader = RoomLoader::new();
    loader.open(&assets_dir);

    let mut ui = UiState {
        is_loading: true,
        ..Default::default()
    };

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 六张图全部到齐后才组装房间
        if let Some(room) = loader.poll() {
            match build_scene(&room, &config) {
                Ok(s) => {
                    renderer.load_room(&s, &room);
                    scene = Some(s);
                }
                Err(e) => log::error!("cannot lay out room: {e}"),
            }
            ui.is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件；松开按键总要传下去，否则拖拽会卡住
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                let is_release = matches!(
                    event,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        ..
                    }
                );
                if response.consumed && !is_release {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        view.set_aspect(renderer.aspect());
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        view.set_aspect(renderer.aspect());
                    }

                    // 键盘快捷键
                    WindowEvent::KeyboardInput { input: key, .. } => {
                        if key.state == ElementState::Pressed {
                            match key.virtual_keycode {
                                Some(VirtualKeyCode::O) => ui.open_folder = pick_room_folder(),
                                Some(VirtualKeyCode::R) => ui.reset_view = true,
                                Some(VirtualKeyCode::F11) => ui.toggle_fullscreen = true,
                                _ => {}
                            }
                        }
                    }

                    // 鼠标交互
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            let walls: &[WallSpec] = match &scene {
                                Some(s) => s.walls(),
                                None => &[],
                            };
                            let viewport =
                                Viewport::new(renderer.size.width as f32, renderer.size.height as f32);
                            input.pointer_down(
                                cursor.x as f32,
                                cursor.y as f32,
                                viewport,
                                walls,
                                &mut view,
                                now_ms(),
                            );
                        }
                        ElementState::Released => input.pointer_up(),
                    },

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = position;
                        input.pointer_move(position.x as f32, position.y as f32, &mut view);
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        // 与浏览器一致：向下滚动为正，相机后退
                        let delta_y = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_UNITS,
                            MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
                        };
                        input.wheel(delta_y, &mut view);
                    }

                    WindowEvent::DroppedFile(path) => {
                        // 拖入文件夹或其中任一图片
                        let dir = if path.is_dir() {
                            Some(path)
                        } else {
                            path.parent().map(Path::to_path_buf)
                        };
                        ui.open_folder = dir;
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                // FPS 统计
                frame_count += 1;
                let now = Instant::now();
                let since = now.duration_since(last_frame_time).as_secs_f32();
                if since >= 1.0 {
                    ui.fps = frame_count as f32 / since;
                    frame_count = 0;
                    last_frame_time = now;
                }

                match view.tick(now_ms()) {
                    TickOutcome::Continue { progress } => ui.transition_progress = progress,
                    TickOutcome::Complete | TickOutcome::None => ui.transition_progress = 0.0,
                }
                renderer.update_camera(view.camera(), view.fov_y(), view.enclosure_rotation());

                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &mut ui, &view, &input);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                apply_requests(&mut ui, &window, &mut view, &mut loader);
                if ui.exit {
                    *control_flow = ControlFlow::Exit;
                }
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn pick_room_folder() -> Option<PathBuf> {
    rfd::FileDialog::new().set_title("Open room folder").pick_folder()
}

fn apply_requests(
    ui: &mut UiState,
    window: &Window,
    view: &mut ViewTransitionController,
    loader: &mut RoomLoader,
) {
    if let Some(dir) = ui.open_folder.take() {
        ui.is_loading = true;
        loader.open(&dir);
    }

    if std::mem::take(&mut ui.reset_view) && !view.reset_view() {
        log::debug!("reset ignored during transition");
    }

    if std::mem::take(&mut ui.toggle_fullscreen) {
        ui.is_fullscreen = !ui.is_fullscreen;
        if ui.is_fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            window.set_fullscreen(None);
        }
    }
}

fn draw_ui(
    ctx: &egui::Context,
    ui_state: &mut UiState,
    view: &ViewTransitionController,
    input: &InputController,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File
            ui.menu_button("File", |ui| {
                if ui.button("Open room folder… (O)").clicked() {
                    ui.close_menu();
                    ui_state.open_folder = pick_room_folder();
                }
                if ui.button("Exit").clicked() {
                    ui_state.exit = true;
                }
            });

            // View
            ui.menu_button("View", |ui| {
                let idle = !view.is_running();
                if ui.add_enabled(idle, egui::Button::new("Reset view (R)")).clicked() {
                    ui_state.reset_view = true;
                    ui.close_menu();
                }

                let label = if ui_state.is_fullscreen {
                    "Exit fullscreen (F11)"
                } else {
                    "Fullscreen (F11)"
                };
                if ui.button(label).clicked() {
                    ui_state.toggle_fullscreen = true;
                    ui.close_menu();
                }

                ui.separator();
                if ui.checkbox(&mut ui_state.show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui_state.is_loading {
                ui.label(egui::RichText::new("Loading room…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let phase = match view.phase() {
                Phase::Idle if input.drag().active => "Dragging".to_string(),
                Phase::Idle => "Free".to_string(),
                Phase::Running(t) => format!(
                    "Framing {:?} {:.0}%",
                    t.wall,
                    ui_state.transition_progress * 100.0
                ),
            };
            ui.label(phase);
            ui.label("|");

            let rot = view.enclosure_rotation();
            ui.label(format!("Yaw: {:.1}°", rot.y.to_degrees()));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", rot.x.to_degrees()));
            ui.label("|");
            ui.label(format!("Distance: {:.2}", view.camera().position.z));

            if ui_state.show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", ui_state.fps)).color(egui::Color32::GREEN),
                );
            }
        });
    });
}
